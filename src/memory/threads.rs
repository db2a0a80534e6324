//! 线程记忆：按 thread_id 保存 ConversationState，并提供每线程的独占锁
//!
//! 生命周期仅限进程内，无过期策略。同一 thread_id 的请求须先 lock 再 get / put，
//! 锁守卫在写回后（或出错时）随作用域释放。

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::memory::ConversationState;

/// 持有期间独占某个线程的状态
pub type ThreadGuard = OwnedMutexGuard<()>;

#[derive(Default)]
pub struct ThreadMemory {
    states: RwLock<HashMap<String, ConversationState>>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ThreadMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取线程的独占锁；同一线程的第二个请求在此等待
    pub async fn lock(&self, thread_id: &str) -> ThreadGuard {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(thread_id.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    /// 取出线程状态的副本；未见过的线程返回空状态
    pub async fn get(&self, thread_id: &str) -> ConversationState {
        self.states
            .read()
            .await
            .get(thread_id)
            .cloned()
            .unwrap_or_else(|| ConversationState::new(thread_id))
    }

    pub async fn put(&self, thread_id: &str, state: ConversationState) {
        self.states.write().await.insert(thread_id.to_string(), state);
    }
}
