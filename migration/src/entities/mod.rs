pub mod budget;
pub mod category;
pub mod goal;
pub mod notification;
pub mod push_subscription;
pub mod transaction;
pub mod user;

pub use budget::Entity as BudgetEntity;
pub use category::Entity as CategoryEntity;
pub use goal::Entity as GoalEntity;
pub use notification::Entity as NotificationEntity;
pub use push_subscription::Entity as PushSubscriptionEntity;
pub use transaction::Entity as TransactionEntity;
pub use user::Entity as UserEntity;
