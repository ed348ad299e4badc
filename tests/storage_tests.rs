//! Storage backend tests
//!
//! Tests for SeaOrmStorage using temporary SQLite databases.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Once;
use tempfile::TempDir;

use migration::entities::transaction;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use fintrack::config::{DatabaseConfig, init_config};
use fintrack::errors::FintrackError;
use fintrack::storage::backend::Backend;
use fintrack::storage::{
    AlertLevel, BudgetPeriod, DEFAULT_CATEGORIES, ImportBatch, ImportBatchRow, NewBudget,
    NewCategory, NewTransaction, NewUser, SeaOrmStorage, TransactionFilter, TransactionKind,
    duplicate_key,
};

// 确保 config 只初始化一次
static INIT: Once = Once::new();

fn init_test_config() {
    INIT.call_once(|| {
        init_config();
    });
}

/// 创建临时 SQLite 数据库的存储实例
async fn create_temp_storage() -> (SeaOrmStorage, TempDir) {
    init_test_config();

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let config = DatabaseConfig {
        database_url: format!("sqlite://{}?mode=rwc", db_path.display()),
        ..Default::default()
    };

    let storage = SeaOrmStorage::connect(&config)
        .await
        .expect("Failed to create storage");

    (storage, temp_dir)
}

async fn create_user(storage: &SeaOrmStorage, email: &str) -> i64 {
    storage
        .create_user(NewUser {
            email: email.to_string(),
            password_hash: "$argon2id$placeholder".to_string(),
            name: "Storage Test".to_string(),
            currency: "USD".to_string(),
        })
        .await
        .expect("Failed to create user")
        .id
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn expense(cents: i64, day: &str, description: &str, category_id: Option<i64>) -> NewTransaction {
    NewTransaction {
        category_id,
        kind: TransactionKind::Expense,
        amount: Decimal::new(cents, 2),
        description: description.to_string(),
        date: date(day),
    }
}

// =============================================================================
// 后端推断
// =============================================================================

#[cfg(test)]
mod backend_inference_tests {
    use super::*;

    #[test]
    fn test_infer_backend_from_url() {
        assert_eq!(Backend::from_url("sqlite://data.db").unwrap(), Backend::Sqlite);
        assert_eq!(Backend::from_url("fintrack.db").unwrap(), Backend::Sqlite);
        assert_eq!(
            Backend::from_url("mariadb://user@localhost/fintrack").unwrap(),
            Backend::MySql
        );
        assert_eq!(
            Backend::from_url("postgresql://localhost/fintrack").unwrap().name(),
            "postgres"
        );
    }

    #[test]
    fn test_unknown_backend_is_config_error() {
        let err = Backend::from_url("redis://localhost").unwrap_err();
        assert!(matches!(err, FintrackError::DatabaseConfig(_)));
    }

    #[tokio::test]
    async fn test_connect_requires_url() {
        init_test_config();
        let err = SeaOrmStorage::connect(&DatabaseConfig {
            database_url: "  ".to_string(),
            ..Default::default()
        })
        .await
        .err()
        .expect("empty url should fail");
        assert!(matches!(err, FintrackError::DatabaseConfig(_)));
    }
}

// =============================================================================
// 用户与分类
// =============================================================================

#[cfg(test)]
mod user_tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let (storage, _dir) = create_temp_storage().await;
        create_user(&storage, "dup@example.com").await;

        let err = storage
            .create_user(NewUser {
                email: "dup@example.com".to_string(),
                password_hash: "x".to_string(),
                name: "Again".to_string(),
                currency: "USD".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, FintrackError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_new_user_defaults() {
        let (storage, _dir) = create_temp_storage().await;
        let id = create_user(&storage, "defaults@example.com").await;

        let user = storage.get_user(id).await.unwrap().unwrap();
        assert!(user.email_notifications);
        assert!(!user.push_notifications);
        assert_eq!(user.budget_alert_threshold, 80);

        let found = storage
            .find_user_by_email("defaults@example.com")
            .await
            .unwrap();
        assert_eq!(found.map(|u| u.id), Some(id));
    }

    #[tokio::test]
    async fn test_default_categories() {
        let (storage, _dir) = create_temp_storage().await;
        let id = create_user(&storage, "cats@example.com").await;
        storage.create_default_categories(id).await.unwrap();

        let all = storage.list_categories(id, None).await.unwrap();
        assert_eq!(all.len(), DEFAULT_CATEGORIES.len());

        let income = storage
            .list_categories(id, Some(TransactionKind::Income))
            .await
            .unwrap();
        assert!(income.iter().all(|c| c.kind == TransactionKind::Income));

        // 名称查找不区分大小写
        let food = storage
            .find_category_by_name(id, TransactionKind::Expense, "FOOD")
            .await
            .unwrap();
        assert_eq!(food.map(|c| c.name), Some("Food".to_string()));
    }
}

// =============================================================================
// 交易
// =============================================================================

#[cfg(test)]
mod transaction_tests {
    use super::*;

    #[tokio::test]
    async fn test_amount_roundtrip_in_cents() {
        let (storage, _dir) = create_temp_storage().await;
        let user = create_user(&storage, "cents@example.com").await;

        let tx = storage
            .create_transaction(user, &expense(1_999, "2025-01-05", "Book", None))
            .await
            .unwrap();
        assert_eq!(tx.amount, Decimal::new(1_999, 2));
        assert_eq!(tx.amount.to_string(), "19.99");
    }

    #[tokio::test]
    async fn test_sum_expense_window_is_half_open() {
        let (storage, _dir) = create_temp_storage().await;
        let user = create_user(&storage, "sum@example.com").await;

        for (cents, day) in [(1_000, "2025-02-28"), (2_000, "2025-03-01"), (4_000, "2025-04-01")] {
            storage
                .create_transaction(user, &expense(cents, day, "x", None))
                .await
                .unwrap();
        }

        let sum = storage
            .sum_expense_cents(user, date("2025-03-01"), date("2025-04-01"), None)
            .await
            .unwrap();
        assert_eq!(sum, 2_000);
    }

    #[tokio::test]
    async fn test_sum_expense_overflow_is_an_error() {
        let (storage, _dir) = create_temp_storage().await;
        let user = create_user(&storage, "sum-overflow@example.com").await;

        for day in ["2025-03-01", "2025-03-02"] {
            storage
                .create_transaction(user, &expense(100, day, "x", None))
                .await
                .unwrap();
        }
        // 直接写入超出单笔上限的金额，两笔之和超过 i64
        transaction::Entity::update_many()
            .col_expr(transaction::Column::AmountCents, Expr::value(i64::MAX / 2 + 1))
            .filter(transaction::Column::UserId.eq(user))
            .exec(storage.get_db())
            .await
            .unwrap();

        let err = storage
            .sum_expense_cents(user, date("2025-03-01"), date("2025-04-01"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, FintrackError::Internal(_)));
    }

    #[tokio::test]
    async fn test_batch_insert_and_duplicate_keys() {
        let (storage, _dir) = create_temp_storage().await;
        let user = create_user(&storage, "batch@example.com").await;

        let batch = ImportBatch {
            categories: Vec::new(),
            rows: (1..=3)
                .map(|i| ImportBatchRow {
                    transaction: expense(i * 100, &format!("2025-05-0{}", i), "Coffee Shop", None),
                    pending_category: None,
                })
                .collect(),
        };
        let created = storage
            .insert_import_batch(user, &batch, "batch-1")
            .await
            .unwrap();
        assert!(created.is_empty());

        let keys = storage
            .duplicate_keys_between(user, date("2025-05-01"), date("2025-05-02"))
            .await
            .unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&duplicate_key(
            date("2025-05-02"),
            200,
            TransactionKind::Expense,
            "  coffee shop "
        )));

        let all = storage
            .find_transactions(user, &TransactionFilter::default())
            .await
            .unwrap();
        assert!(all.iter().all(|t| t.import_batch.as_deref() == Some("batch-1")));
    }

    #[tokio::test]
    async fn test_import_batch_creates_categories_in_same_transaction() {
        let (storage, _dir) = create_temp_storage().await;
        let user = create_user(&storage, "batch-cat@example.com").await;

        let new_category = |name: &str| NewCategory {
            name: name.to_string(),
            kind: TransactionKind::Expense,
            color: None,
            icon: None,
        };
        let row = |cents: i64, pending: usize| ImportBatchRow {
            transaction: expense(cents, "2025-06-01", "Imported", None),
            pending_category: Some(pending),
        };

        let batch = ImportBatch {
            categories: vec![new_category("Books")],
            rows: vec![row(100, 0), row(200, 0)],
        };
        let created = storage
            .insert_import_batch(user, &batch, "batch-ok")
            .await
            .unwrap();
        assert_eq!(created.len(), 1);
        let all = storage
            .find_transactions(user, &TransactionFilter::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|t| t.category_id == Some(created[0].id)));

        // 第二个分类与第一个同名，唯一索引冲突使整个批次回滚
        let failing = ImportBatch {
            categories: vec![new_category("Games"), new_category("Games")],
            rows: vec![row(300, 0), row(400, 1)],
        };
        let err = storage
            .insert_import_batch(user, &failing, "batch-fail")
            .await
            .unwrap_err();
        assert!(matches!(err, FintrackError::Conflict(_)));

        let categories = storage.list_categories(user, None).await.unwrap();
        assert!(categories.iter().all(|c| c.name != "Games"));
        let all = storage
            .find_transactions(user, &TransactionFilter::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_transactions_scoped_by_user() {
        let (storage, _dir) = create_temp_storage().await;
        let alice = create_user(&storage, "alice@example.com").await;
        let bob = create_user(&storage, "bob@example.com").await;

        let tx = storage
            .create_transaction(alice, &expense(500, "2025-01-01", "Lunch", None))
            .await
            .unwrap();

        assert!(storage.get_transaction(bob, tx.id).await.unwrap().is_none());
        let err = storage.delete_transaction(bob, tx.id).await.unwrap_err();
        assert!(matches!(err, FintrackError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_category_detaches_transactions() {
        let (storage, _dir) = create_temp_storage().await;
        let user = create_user(&storage, "detach@example.com").await;
        storage.create_default_categories(user).await.unwrap();
        let food = storage
            .find_category_by_name(user, TransactionKind::Expense, "Food")
            .await
            .unwrap()
            .unwrap();

        let tx = storage
            .create_transaction(user, &expense(700, "2025-01-01", "Pizza", Some(food.id)))
            .await
            .unwrap();
        storage.delete_category(user, food.id).await.unwrap();

        let tx = storage.get_transaction(user, tx.id).await.unwrap().unwrap();
        assert_eq!(tx.category_id, None);
    }
}

// =============================================================================
// 预算、通知与推送订阅
// =============================================================================

#[cfg(test)]
mod budget_and_notification_tests {
    use super::*;
    use fintrack::storage::NotificationKind;

    #[tokio::test]
    async fn test_budgets_covering_and_alert_record() {
        let (storage, _dir) = create_temp_storage().await;
        let user = create_user(&storage, "budgets@example.com").await;
        storage.create_default_categories(user).await.unwrap();
        let food = storage
            .find_category_by_name(user, TransactionKind::Expense, "Food")
            .await
            .unwrap()
            .unwrap();
        let transport = storage
            .find_category_by_name(user, TransactionKind::Expense, "Transport")
            .await
            .unwrap()
            .unwrap();

        let budget = |name: &str, category_id| NewBudget {
            category_id,
            name: name.to_string(),
            amount: Decimal::from(100),
            period: BudgetPeriod::Monthly,
            start_date: date("2025-01-01"),
        };
        let overall = storage.create_budget(user, budget("All", None)).await.unwrap();
        storage
            .create_budget(user, budget("Food", Some(food.id)))
            .await
            .unwrap();

        assert_eq!(
            storage.budgets_covering(user, Some(food.id)).await.unwrap().len(),
            2
        );
        assert_eq!(
            storage
                .budgets_covering(user, Some(transport.id))
                .await
                .unwrap()
                .len(),
            1
        );

        storage
            .record_budget_alert(overall.id, date("2025-03-01"), AlertLevel::Warning)
            .await
            .unwrap();
        let reloaded = storage.get_budget(user, overall.id).await.unwrap().unwrap();
        assert_eq!(reloaded.alert_period_start, Some(date("2025-03-01")));
        assert_eq!(reloaded.alert_level, Some(AlertLevel::Warning));
    }

    #[tokio::test]
    async fn test_notification_read_state() {
        let (storage, _dir) = create_temp_storage().await;
        let user = create_user(&storage, "notes@example.com").await;

        for i in 0..3 {
            storage
                .create_notification(user, NotificationKind::Test, &format!("n{}", i), "body")
                .await
                .unwrap();
        }
        assert_eq!(storage.unread_notification_count(user).await.unwrap(), 3);

        let list = storage.list_notifications(user, false, 2).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].title, "n2");

        storage.mark_notification_read(user, list[0].id).await.unwrap();
        assert_eq!(
            storage.list_notifications(user, true, 10).await.unwrap().len(),
            2
        );
        assert_eq!(storage.mark_all_notifications_read(user).await.unwrap(), 2);
        assert_eq!(storage.unread_notification_count(user).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_push_subscription_moves_between_users() {
        let (storage, _dir) = create_temp_storage().await;
        let alice = create_user(&storage, "push-alice@example.com").await;
        let bob = create_user(&storage, "push-bob@example.com").await;
        let endpoint = "https://push.example.com/shared-browser";

        let first = storage
            .upsert_push_subscription(alice, endpoint, "key-a", "auth-a")
            .await
            .unwrap();
        let second = storage
            .upsert_push_subscription(bob, endpoint, "key-b", "auth-b")
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.user_id, bob);
        assert_eq!(second.p256dh, "key-b");
        assert!(storage.list_push_subscriptions(alice).await.unwrap().is_empty());

        storage.prune_push_subscription(second.id).await.unwrap();
        assert!(storage.list_push_subscriptions(bob).await.unwrap().is_empty());
    }
}
