#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use roomboard::{
    AuthError, AuthProvider, AuthUser, Board, Collection, DocumentStore, MemoryStore, StoreHandle,
};
use serde_json::json;

/// Test double for the external auth provider: one accepted credential pair,
/// structural email validation, and a sign-out counter.
pub struct StubAuth {
    pub email: String,
    pub password: String,
    pub sign_outs: AtomicUsize,
}

impl StubAuth {
    pub fn new(email: &str, password: &str) -> Self {
        StubAuth {
            email: email.to_string(),
            password: password.to_string(),
            sign_outs: AtomicUsize::new(0),
        }
    }

    pub fn sign_out_count(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthProvider for StubAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        if !email.contains('@') {
            return Err(AuthError::InvalidEmail);
        }
        if email == self.email && password == self.password {
            Ok(AuthUser {
                email: email.to_string(),
            })
        } else {
            Err(AuthError::WrongCredentials)
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Board over an empty in-memory store populated with the given workers and
/// rooms, with an admin session already established.
pub async fn admin_board(workers: &[(i64, &str, &str)], rooms: &[(i64, &str)]) -> Board {
    let board = board(workers, rooms).await;
    board.resume_admin("admin@example.com");
    board
}

/// Same fixture without a session.
pub async fn board(workers: &[(i64, &str, &str)], rooms: &[(i64, &str)]) -> Board {
    let store: StoreHandle = Arc::new(MemoryStore::new());
    for &(id, name, code) in workers {
        store
            .add(
                Collection::Workers,
                json!({"id": id, "name": name, "code": code}),
            )
            .await
            .expect("seed worker");
    }
    for &(id, number) in rooms {
        store
            .add(
                Collection::Rooms,
                json!({"id": id, "number": number, "tags": []}),
            )
            .await
            .expect("seed room");
    }
    Board::with_store(store, Arc::new(StubAuth::new("admin@example.com", "pw")), true)
}
