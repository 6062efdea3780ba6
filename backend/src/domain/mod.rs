//! # Domain Layer
//!
//! Game rules and the services that apply them. Pure rule modules
//! (`reward_formula`, `leveling`, `modifiers`, `recurrence`, `completion`)
//! never touch storage; services load records, run the rules and write the
//! result back through a single `ChangeSet` commit.

pub mod clock;
pub mod completion;
pub mod errors;
pub mod game_config;
pub mod leveling;
pub mod life_area_service;
pub mod modifiers;
pub mod quest_service;
pub mod recurrence;
pub mod reward_formula;
pub mod reward_shop_service;
pub mod subtask_service;
pub mod user_service;
pub mod validation;

pub use clock::{Clock, FixedClock, SystemClock};
pub use errors::{DomainError, DomainResult};
pub use life_area_service::LifeAreaService;
pub use modifiers::{FixedRoll, RandomSource, ThreadRandom};
pub use quest_service::QuestService;
pub use reward_shop_service::RewardShopService;
pub use subtask_service::SubtaskService;
pub use user_service::UserService;
