//! Goal workflows built on top of the finance store.
//!
//! ## Business Rules
//!
//! - Contributions must be positive; money moved into a goal is recorded
//!   as an expense so the balance reflects it
//! - Cancelling a goal with savings refunds them as income before the goal
//!   is removed

use log::info;
use shared::{Goal, GoalOverview, GoalPatch, NewTransaction, TransactionCategory, TransactionType};

use crate::backend::domain::error::{StoreError, StoreResult};
use crate::backend::domain::stats::today;
use crate::backend::domain::store::FinanceStore;

#[derive(Clone)]
pub struct GoalService {
    store: FinanceStore,
}

impl GoalService {
    pub fn new(store: FinanceStore) -> Self {
        Self { store }
    }

    async fn held_goal(&self, goal_id: &str) -> StoreResult<Goal> {
        self.store
            .goals()
            .await
            .into_iter()
            .find(|g| g.id == goal_id)
            .ok_or_else(|| StoreError::not_found("Goal", goal_id))
    }

    /// Move `amount` into a goal and record it as an expense
    pub async fn contribute(&self, goal_id: &str, amount: f64) -> StoreResult<Goal> {
        info!("Contributing {:.2} to goal {}", amount, goal_id);
        if amount.is_nan() || amount <= 0.0 {
            let err = StoreError::Validation("Contribution must be greater than zero".to_string());
            return Err(self.store.record_failure("contribute", err).await);
        }
        let goal = match self.held_goal(goal_id).await {
            Ok(goal) => goal,
            Err(e) => return Err(self.store.record_failure("contribute", e).await),
        };

        let patch = GoalPatch {
            current_amount: Some(goal.current_amount + amount),
            ..Default::default()
        };
        let updated = self.store.update_goal(goal_id, patch).await?;

        self.store
            .add_transaction(NewTransaction {
                description: format!("Deposit to goal: {}", goal.name),
                amount: -amount,
                category: TransactionCategory::Other,
                transaction_type: TransactionType::Expense,
                date: today(),
            })
            .await?;
        Ok(updated)
    }

    /// Remove a goal, refunding whatever was saved towards it
    pub async fn cancel(&self, goal_id: &str) -> StoreResult<()> {
        info!("Cancelling goal {}", goal_id);
        let goal = match self.held_goal(goal_id).await {
            Ok(goal) => goal,
            Err(e) => return Err(self.store.record_failure("cancel_goal", e).await),
        };

        if goal.current_amount > 0.0 {
            self.store
                .add_transaction(NewTransaction {
                    description: format!("Goal refund: {}", goal.name),
                    amount: goal.current_amount,
                    category: TransactionCategory::Other,
                    transaction_type: TransactionType::Income,
                    date: today(),
                })
                .await?;
        }
        self.store.delete_goal(goal_id).await
    }

    pub async fn overview(&self) -> GoalOverview {
        overview(&self.store.goals().await)
    }
}

pub fn overview(goals: &[Goal]) -> GoalOverview {
    let total_saved: f64 = goals.iter().map(|g| g.current_amount).sum();
    let total_target: f64 = goals.iter().map(|g| g.target_amount).sum();
    let overall_progress = if total_target > 0.0 {
        total_saved / total_target * 100.0
    } else {
        0.0
    };
    GoalOverview {
        goal_count: goals.len(),
        total_saved,
        total_target,
        overall_progress,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::storage::LocalRepository;
    use chrono::NaiveDate;
    use shared::NewGoal;
    use std::sync::Arc;

    async fn service_with_goal(current_amount: f64) -> (GoalService, FinanceStore, Goal) {
        let store = FinanceStore::new(Arc::new(LocalRepository::new()));
        let goal = store
            .add_goal(NewGoal {
                name: "Bike".to_string(),
                target_amount: 1000.0,
                current_amount,
                deadline: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
                recurring: false,
            })
            .await
            .unwrap();
        (GoalService::new(store.clone()), store, goal)
    }

    #[tokio::test]
    async fn test_contribute_moves_money_into_goal() {
        let (service, store, goal) = service_with_goal(100.0).await;

        let updated = service.contribute(&goal.id, 150.0).await.unwrap();

        assert_eq!(updated.current_amount, 250.0);
        let state = store.state().await;
        assert_eq!(state.balance, -150.0);
        assert_eq!(state.transactions[0].description, "Deposit to goal: Bike");
        assert_eq!(state.transactions[0].transaction_type, TransactionType::Expense);
    }

    #[tokio::test]
    async fn test_contribute_rejects_non_positive_amounts() {
        let (service, store, goal) = service_with_goal(0.0).await;

        let err = service.contribute(&goal.id, 0.0).await.unwrap_err();

        assert!(matches!(err, StoreError::Validation(_)));
        assert!(store.state().await.error.is_some());
        assert!(store.transactions().await.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_refunds_savings() {
        let (service, store, goal) = service_with_goal(300.0).await;

        service.cancel(&goal.id).await.unwrap();

        let state = store.state().await;
        assert!(state.goals.is_empty());
        assert_eq!(state.balance, 300.0);
        assert_eq!(state.transactions[0].description, "Goal refund: Bike");
    }

    #[tokio::test]
    async fn test_cancel_without_savings_records_nothing() {
        let (service, store, goal) = service_with_goal(0.0).await;

        service.cancel(&goal.id).await.unwrap();

        assert!(store.transactions().await.is_empty());
        assert!(store.goals().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_goal_is_not_found() {
        let (service, _store, _goal) = service_with_goal(0.0).await;
        let err = service.cancel("nope").await.unwrap_err();
        assert_eq!(err, StoreError::not_found("Goal", "nope"));
    }

    #[test]
    fn test_overview() {
        let deadline = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        let goal = |id: &str, current: f64, target: f64| Goal {
            id: id.to_string(),
            name: id.to_string(),
            target_amount: target,
            current_amount: current,
            deadline,
            recurring: false,
        };

        let summary = overview(&[goal("a", 250.0, 1000.0), goal("b", 250.0, 1500.0)]);
        assert_eq!(summary.goal_count, 2);
        assert_eq!(summary.total_saved, 500.0);
        assert_eq!(summary.total_target, 2500.0);
        assert!((summary.overall_progress - 20.0).abs() < 1e-9);

        assert_eq!(overview(&[]).overall_progress, 0.0);
    }
}
