use std::sync::Arc;

use crate::repository::AdminRepository;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn AdminRepository>,
}

impl AppState {
    pub fn new(repo: Arc<dyn AdminRepository>) -> Self {
        Self { repo }
    }
}
