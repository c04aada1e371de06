//! Fixed fallback dataset used when no document store is configured.
//! Held only in memory; nothing here survives a restart.

use serde_json::Value;

use crate::model::{Room, Worker};
use crate::store::Collection;

pub fn workers() -> Vec<Worker> {
    vec![
        Worker {
            id: 1,
            name: "김철수".into(),
            code: "HK8X2M".into(),
        },
        Worker {
            id: 2,
            name: "이영희".into(),
            code: "PQ7K9R".into(),
        },
    ]
}

pub fn rooms() -> Vec<Room> {
    let numbers: &[(i64, &str)] = &[
        // 시그니처
        (1, "506"),
        (2, "511"),
        (3, "709"),
        (4, "711"),
        (5, "809"),
        (6, "810"),
        (7, "906"),
        (8, "907"),
        (9, "908"),
        (10, "909"),
        (11, "911"),
        (12, "1006"),
        (13, "1107"),
        (14, "1206"),
        (15, "1210"),
        (16, "1211"),
        (17, "1410"),
        (18, "1510"),
        (19, "1607"),
        (20, "1609"),
        (21, "1610"),
        (22, "1611"),
        (23, "1707"),
        (24, "1709"),
        (25, "1806"),
        (26, "1810"),
        (27, "1909"),
        // 프리미엄
        (28, "718"),
        (29, "816"),
        (30, "1017"),
        (31, "1217"),
        (32, "1317"),
        (33, "1416"),
        (34, "1417"),
        (35, "1616"),
        (36, "1617"),
        (37, "1618"),
        (38, "1716"),
        (39, "1717"),
        (40, "1718"),
        (41, "1916"),
        (42, "1917"),
        // 스탠다드
        (43, "1205"),
        (44, "1413"),
        (45, "1815"),
        (46, "1904"),
        (47, "1905"),
        (48, "1912"),
        (49, "1913"),
    ];
    numbers
        .iter()
        .map(|&(id, number)| Room {
            id,
            number: number.into(),
            tags: Vec::new(),
        })
        .collect()
}

/// Seed dataset as raw store documents, in insertion order.
pub fn documents() -> Vec<(Collection, Value)> {
    let mut docs = Vec::new();
    for worker in workers() {
        docs.push((
            Collection::Workers,
            serde_json::to_value(worker).expect("worker seed serializes"),
        ));
    }
    for room in rooms() {
        docs.push((
            Collection::Rooms,
            serde_json::to_value(room).expect("room seed serializes"),
        ));
    }
    docs
}
