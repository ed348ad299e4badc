//! 通知模板
//!
//! 每个事件渲染为三种形态：站内通知（标题 + 正文）、邮件（主题 + 纯文本 + HTML）
//! 与推送负载（标题 + 短正文 + 跳转地址 + tag）。
//! 用户输入的字符串（预算名、目标名、用户名）在 HTML 中一律转义。

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::storage::models::NotificationKind;
use crate::utils::money::format_money;

/// 推送正文最大字符数
pub const PUSH_BODY_MAX_CHARS: usize = 120;

/// Events that produce a notification
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationEvent {
    Welcome,
    BudgetWarning {
        budget_id: i64,
        budget_name: String,
        spent: Decimal,
        limit: Decimal,
        percent: Decimal,
        period_end: NaiveDate,
    },
    BudgetExceeded {
        budget_id: i64,
        budget_name: String,
        spent: Decimal,
        limit: Decimal,
        percent: Decimal,
        period_end: NaiveDate,
    },
    GoalReached {
        goal_id: i64,
        goal_name: String,
        target: Decimal,
    },
    ImportCompleted {
        imported: usize,
        skipped: usize,
        failed: usize,
    },
    Test,
}

impl NotificationEvent {
    pub fn kind(&self) -> NotificationKind {
        match self {
            NotificationEvent::Welcome => NotificationKind::Welcome,
            NotificationEvent::BudgetWarning { .. } => NotificationKind::BudgetWarning,
            NotificationEvent::BudgetExceeded { .. } => NotificationKind::BudgetExceeded,
            NotificationEvent::GoalReached { .. } => NotificationKind::GoalReached,
            NotificationEvent::ImportCompleted { .. } => NotificationKind::ImportCompleted,
            NotificationEvent::Test => NotificationKind::Test,
        }
    }
}

/// Per-recipient values used while rendering
#[derive(Debug, Clone, Copy)]
pub struct TemplateContext<'a> {
    pub user_name: &'a str,
    pub currency: &'a str,
    pub app_url: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    pub url: String,
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedNotification {
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub email: EmailMessage,
    pub push: PushPayload,
}

/// 事件的公共部分：标题、正文、前端路径、推送 tag
struct Parts {
    title: String,
    body: String,
    path: String,
    tag: String,
}

fn parts(event: &NotificationEvent, ctx: &TemplateContext<'_>) -> Parts {
    let money = |amount: Decimal| format_money(amount, ctx.currency);

    match event {
        NotificationEvent::Welcome => Parts {
            title: "Welcome to Fintrack".to_string(),
            body: "Your account is ready. Add your first transaction or import a bank statement to get started.".to_string(),
            path: "/".to_string(),
            tag: "welcome".to_string(),
        },
        NotificationEvent::BudgetWarning {
            budget_id,
            budget_name,
            spent,
            limit,
            percent,
            period_end,
        } => Parts {
            title: format!("Budget \"{}\" is at {}%", budget_name, percent.normalize()),
            body: format!(
                "You have spent {} of {} for \"{}\". The current period ends on {}.",
                money(*spent),
                money(*limit),
                budget_name,
                period_end.format("%Y-%m-%d")
            ),
            path: format!("/budgets/{}", budget_id),
            tag: format!("budget-{}-warning", budget_id),
        },
        NotificationEvent::BudgetExceeded {
            budget_id,
            budget_name,
            spent,
            limit,
            percent,
            period_end,
        } => Parts {
            title: format!("Budget \"{}\" exceeded", budget_name),
            body: format!(
                "You have spent {} of {} for \"{}\" ({}%), {} over the limit. The current period ends on {}.",
                money(*spent),
                money(*limit),
                budget_name,
                percent.normalize(),
                money(*spent - *limit),
                period_end.format("%Y-%m-%d")
            ),
            path: format!("/budgets/{}", budget_id),
            tag: format!("budget-{}-exceeded", budget_id),
        },
        NotificationEvent::GoalReached {
            goal_id,
            goal_name,
            target,
        } => Parts {
            title: format!("Goal \"{}\" reached", goal_name),
            body: format!(
                "Congratulations! You saved {} for \"{}\".",
                money(*target),
                goal_name
            ),
            path: format!("/goals/{}", goal_id),
            tag: format!("goal-{}", goal_id),
        },
        NotificationEvent::ImportCompleted {
            imported,
            skipped,
            failed,
        } => Parts {
            title: "Import completed".to_string(),
            body: format!(
                "{} transactions imported, {} skipped as duplicates, {} rows failed.",
                imported, skipped, failed
            ),
            path: "/transactions".to_string(),
            tag: "import".to_string(),
        },
        NotificationEvent::Test => Parts {
            title: "Test notification".to_string(),
            body: "Notifications are working. You will receive budget and goal alerts here."
                .to_string(),
            path: "/settings".to_string(),
            tag: "test".to_string(),
        },
    }
}

/// Render an event for one recipient
pub fn render(event: &NotificationEvent, ctx: &TemplateContext<'_>) -> RenderedNotification {
    let Parts {
        title,
        body,
        path,
        tag,
    } = parts(event, ctx);
    let url = format!("{}{}", ctx.app_url.trim_end_matches('/'), path);

    let text = format!(
        "Hi {},\n\n{}\n\nOpen Fintrack: {}\n\nYou can change notification preferences in your settings.\n",
        ctx.user_name, body, url
    );
    let html = format!(
        concat!(
            "<!DOCTYPE html><html><body style=\"font-family:sans-serif;color:#222\">",
            "<p>Hi {name},</p>",
            "<h2 style=\"font-size:18px\">{title}</h2>",
            "<p>{body}</p>",
            "<p><a href=\"{url}\">Open Fintrack</a></p>",
            "<p style=\"font-size:12px;color:#888\">You can change notification preferences in your settings.</p>",
            "</body></html>"
        ),
        name = escape_html(ctx.user_name),
        title = escape_html(&title),
        body = escape_html(&body),
        url = escape_html(&url),
    );

    RenderedNotification {
        kind: event.kind(),
        email: EmailMessage {
            subject: title.clone(),
            text,
            html,
        },
        push: PushPayload {
            title: title.clone(),
            body: truncate_chars(&body, PUSH_BODY_MAX_CHARS),
            url,
            tag,
        },
        title,
        body,
    }
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// 按字符截断，超长时以省略号结尾（结果不超过 `max` 个字符）
pub fn truncate_chars(input: &str, max: usize) -> String {
    if input.chars().count() <= max {
        return input.to_string();
    }
    let mut out: String = input.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> TemplateContext<'static> {
        TemplateContext {
            user_name: "Ada <admin>",
            currency: "USD",
            app_url: "https://app.example.com/",
        }
    }

    fn warning() -> NotificationEvent {
        NotificationEvent::BudgetWarning {
            budget_id: 7,
            budget_name: "Food & <Drinks>".to_string(),
            spent: Decimal::new(41_000, 2),
            limit: Decimal::new(50_000, 2),
            percent: Decimal::new(8_200, 2),
            period_end: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
        }
    }

    #[test]
    fn test_budget_warning_render() {
        let rendered = render(&warning(), &ctx());
        assert_eq!(rendered.kind, NotificationKind::BudgetWarning);
        assert_eq!(rendered.title, "Budget \"Food & <Drinks>\" is at 82%");
        assert!(rendered.body.contains("$410.00 of $500.00"));
        assert!(rendered.body.contains("2025-03-31"));
        assert_eq!(rendered.push.url, "https://app.example.com/budgets/7");
        assert_eq!(rendered.push.tag, "budget-7-warning");
    }

    #[test]
    fn test_html_escapes_user_strings() {
        let rendered = render(&warning(), &ctx());
        assert!(rendered.email.html.contains("Food &amp; &lt;Drinks&gt;"));
        assert!(rendered.email.html.contains("Hi Ada &lt;admin&gt;"));
        assert!(!rendered.email.html.contains("<Drinks>"));
        // 纯文本不转义
        assert!(rendered.email.text.contains("Food & <Drinks>"));
    }

    #[test]
    fn test_push_body_is_truncated() {
        let event = NotificationEvent::BudgetExceeded {
            budget_id: 1,
            budget_name: "A very long budget name that keeps going and going".to_string(),
            spent: Decimal::new(123_456_789, 2),
            limit: Decimal::new(100_000_000, 2),
            percent: Decimal::new(12_346, 2),
            period_end: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
        };
        let rendered = render(&event, &ctx());
        assert!(rendered.body.chars().count() > PUSH_BODY_MAX_CHARS);
        assert_eq!(rendered.push.body.chars().count(), PUSH_BODY_MAX_CHARS);
        assert!(rendered.push.body.ends_with('…'));
        assert!(rendered.body.contains("$234,567.89 over the limit"));
    }

    #[test]
    fn test_import_completed_render() {
        let rendered = render(
            &NotificationEvent::ImportCompleted {
                imported: 12,
                skipped: 3,
                failed: 1,
            },
            &ctx(),
        );
        assert_eq!(rendered.kind, NotificationKind::ImportCompleted);
        assert_eq!(
            rendered.body,
            "12 transactions imported, 3 skipped as duplicates, 1 rows failed."
        );
        assert_eq!(rendered.push.url, "https://app.example.com/transactions");
    }

    #[test]
    fn test_truncate_chars_handles_multibyte() {
        assert_eq!(truncate_chars("héllo", 10), "héllo");
        assert_eq!(truncate_chars("héllo wörld", 6), "héllo…");
    }
}
