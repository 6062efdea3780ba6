pub mod csv;
pub mod traits;

pub use traits::{
    ChangeSet, Connection, LifeAreaStorage, QuestStorage, RewardStorage, SubtaskStorage,
    UserStorage,
};
