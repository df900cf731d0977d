//! Gateway 应用状态

use std::sync::Arc;

use crate::coach::service::CoachService;

/// Gateway 应用状态
///
/// 上游客户端在启动时构建一次，通过状态注入到所有处理器
#[derive(Clone)]
pub struct AppState {
    coach: Arc<CoachService>,
}

impl AppState {
    pub fn new(coach: CoachService) -> Self {
        Self {
            coach: Arc::new(coach),
        }
    }

    pub fn coach(&self) -> &CoachService {
        &self.coach
    }
}
