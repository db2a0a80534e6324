//! 认知层：Planner（决策步）、主循环、回复后处理、过程事件

pub mod events;
pub mod loop_;
pub mod planner;
pub mod postprocess;

pub use events::LoopEvent;
pub use loop_::{LoopOutcome, LoopSession};
pub use planner::Planner;
pub use postprocess::apply_menu_echo;
