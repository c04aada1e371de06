use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use once_cell::sync::Lazy;
use rand::Rng;
use uuid::timestamp::context::ContextV7;
use uuid::{Timestamp, Uuid};

use crate::time::now_ms;

/// Alphabet for worker login codes. Ambiguous glyphs (I, O, 0, 1) are excluded.
pub const LOGIN_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const LOGIN_CODE_LEN: usize = 6;

// `ContextV7` uses interior `Cell`s and is therefore not `Sync`, so it cannot be
// held in a `static` directly. Wrap it in a `Mutex` to keep the single shared
// context (preserving same-millisecond key ordering) while making it thread-safe.
static KEY_CONTEXT: Lazy<Mutex<ContextV7>> = Lazy::new(|| Mutex::new(ContextV7::new()));

/// Store-assigned document key. v7 keys sort by creation time (the shared
/// context keeps same-millisecond keys ordered too), so key order doubles as
/// insertion order for collection snapshots.
pub fn new_doc_key() -> String {
    let ctx = KEY_CONTEXT.lock().expect("doc-key context poisoned");
    Uuid::new_v7(Timestamp::now(&*ctx)).to_string()
}

/// Next small-integer entity id: one past the current maximum, starting at 1.
pub fn next_entity_id(existing: impl IntoIterator<Item = i64>) -> i64 {
    existing.into_iter().max().map_or(1, |max| max + 1)
}

/// Locally generated assignment id: wall-clock milliseconds, bumped past the
/// previous value so tight bulk loops never collide.
pub fn next_assignment_id() -> i64 {
    static LAST: AtomicI64 = AtomicI64::new(0);
    let now = now_ms();
    LAST.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
        Some(now.max(last + 1))
    })
    .map(|last| now.max(last + 1))
    .unwrap_or(now)
}

fn draw_login_code() -> String {
    let mut rng = rand::rng();
    (0..LOGIN_CODE_LEN)
        .map(|_| LOGIN_CODE_ALPHABET[rng.random_range(0..LOGIN_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Draw login codes until one is not taken. Uniqueness is checked against the
/// caller's view of the current workers at generation time.
pub fn generate_login_code<F>(is_taken: F) -> String
where
    F: Fn(&str) -> bool,
{
    loop {
        let code = draw_login_code();
        if !is_taken(&code) {
            return code;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn next_entity_id_starts_at_one() {
        assert_eq!(next_entity_id(Vec::new()), 1);
        assert_eq!(next_entity_id(vec![1, 5, 3]), 6);
    }

    #[test]
    fn assignment_ids_are_strictly_increasing() {
        let a = next_assignment_id();
        let b = next_assignment_id();
        let c = next_assignment_id();
        assert!(a < b && b < c);
    }

    #[test]
    fn login_code_has_expected_shape() {
        let code = generate_login_code(|_| false);
        assert_eq!(code.len(), LOGIN_CODE_LEN);
        assert!(code.bytes().all(|b| LOGIN_CODE_ALPHABET.contains(&b)));
    }

    #[test]
    fn login_code_avoids_taken_codes() {
        // Capture one draw, then insist the generator never returns it again.
        let taken = generate_login_code(|_| false);
        let mut seen = HashSet::new();
        for _ in 0..64 {
            let code = generate_login_code(|c| c == taken);
            assert_ne!(code, taken);
            seen.insert(code);
        }
        assert!(!seen.contains(&taken));
    }

    #[test]
    fn doc_keys_are_unique_and_ordered() {
        let a = new_doc_key();
        let b = new_doc_key();
        assert_ne!(a, b);
        assert!(a < b);
    }
}
