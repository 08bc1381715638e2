//! Subscription records and spending analytics.
//!
//! All aggregation happens in the backend; these types only mirror what it
//! returns so the dashboard can render it.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::{ApiClient, DataEnvelope};
use crate::error::ClientResult;
use crate::validation::NewSubscription;

/// Billing cycle of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// Short label used in the subscriptions table.
    pub fn cycle_label(&self) -> &'static str {
        match self {
            Frequency::Daily => "dy",
            Frequency::Weekly => "Wk",
            Frequency::Monthly => "Mo",
            Frequency::Yearly => "Yr",
        }
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" => Ok(Frequency::Yearly),
            other => Err(format!("Unknown frequency: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Trial,
    Expired,
    Cancelled,
    /// Any status this client does not know yet
    #[serde(other)]
    Unknown,
}

impl SubscriptionStatus {
    /// Status used for display; unknown values are shown as active.
    pub fn displayed(&self) -> SubscriptionStatus {
        match self {
            SubscriptionStatus::Unknown => SubscriptionStatus::Active,
            other => *other,
        }
    }
}

/// A tracked recurring payment as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub currency: String,
    pub frequency: Frequency,
    #[serde(default)]
    pub status: SubscriptionStatus,
    #[serde(default)]
    pub shared_with: Vec<String>,
    #[serde(default)]
    pub renewal_date: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub cost_per_person: Option<f64>,
    #[serde(default)]
    pub cancel_url: Option<String>,
}

/// Spend for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpend {
    pub category: String,
    #[serde(default)]
    pub subscriptions_count: u32,
    #[serde(default)]
    pub count_percentage: String,
    #[serde(default)]
    pub total_spent: f64,
    #[serde(default)]
    pub cost_percentage: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingRenewal {
    pub name: String,
    pub renewal_date: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub category: Option<String>,
}

impl UpcomingRenewal {
    /// Amount due at renewal: `price` when the backend sent it, else `cost`.
    pub fn amount(&self) -> f64 {
        self.price.unwrap_or(self.cost)
    }
}

/// Response of `GET /subscriptions/user/spendingAnalytics`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SpendingDetails {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub total_subscriptions: u32,
    #[serde(default)]
    pub active_subscriptions: u32,
    #[serde(default)]
    pub total_cost: f64,
    #[serde(default)]
    pub upcoming_count: u32,
    #[serde(default)]
    pub upcoming_renewals: Vec<UpcomingRenewal>,
    #[serde(default)]
    pub data: Vec<CategorySpend>,
}

impl SpendingDetails {
    /// Largest category total, at least 1 so chart scales never divide by zero.
    pub fn max_category_spend(&self) -> f64 {
        self.data.iter().map(|c| c.total_spent).fold(1.0, f64::max)
    }
}

const LIST_FAILED: &str = "Error While Getting User Subscriptions";
const ANALYTICS_FAILED: &str = "Failed To Fetch Your Subscriptions Details";
const CREATE_FAILED: &str = "Failed To Create Subscription";

impl ApiClient {
    /// `GET /subscriptions/user`
    pub async fn list_subscriptions(&self) -> ClientResult<Vec<Subscription>> {
        let res = self.get("/subscriptions/user").await?;
        let body: DataEnvelope<Option<Vec<Subscription>>> = self.expect_json(res, LIST_FAILED).await?;
        Ok(body.data.unwrap_or_default())
    }

    /// `GET /subscriptions/user/spendingAnalytics`
    pub async fn spending_analytics(&self) -> ClientResult<SpendingDetails> {
        let res = self.get("/subscriptions/user/spendingAnalytics").await?;
        self.expect_json(res, ANALYTICS_FAILED).await
    }

    /// `POST /subscriptions`, after local validation.
    pub async fn create_subscription(&self, subscription: NewSubscription) -> ClientResult<Option<Subscription>> {
        subscription.validate()?;
        let subscription = subscription.normalized();

        let res = self.post("/subscriptions", &subscription).await?;
        let body: DataEnvelope<Option<Subscription>> = self.expect_json(res, CREATE_FAILED).await?;
        tracing::info!(name = %subscription.name, "Subscription created");
        Ok(body.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_parsing() {
        assert_eq!("monthly".parse::<Frequency>().unwrap(), Frequency::Monthly);
        assert_eq!(" Yearly ".parse::<Frequency>().unwrap(), Frequency::Yearly);
        assert!("hourly".parse::<Frequency>().is_err());
        assert_eq!(Frequency::Weekly.cycle_label(), "Wk");
    }

    #[test]
    fn test_subscription_deserialization() {
        let json = serde_json::json!({
            "_id": "665f1c0e8a",
            "name": "Spotify",
            "category": "entertainment",
            "price": 11.99,
            "currency": "USD",
            "frequency": "monthly",
            "status": "trial",
            "sharedWith": ["sam@example.com"],
            "renewalDate": "2026-11-01T00:00:00.000Z",
            "startDate": "2026-10-01T00:00:00.000Z",
            "paymentMethod": "card",
            "costPerPerson": 5.995,
            "user": "64f1c2a9e13b"
        });
        let sub: Subscription = serde_json::from_value(json).unwrap();
        assert_eq!(sub.id, "665f1c0e8a");
        assert_eq!(sub.frequency, Frequency::Monthly);
        assert_eq!(sub.status, SubscriptionStatus::Trial);
        assert_eq!(sub.shared_with.len(), 1);
        assert_eq!(sub.cost_per_person, Some(5.995));
    }

    #[test]
    fn test_spending_details_deserialization() {
        let json = serde_json::json!({
            "status": "success",
            "totalSubscriptions": 3,
            "activeSubscriptions": 2,
            "totalCost": 42.5,
            "upcomingCount": 2,
            "upcomingRenewals": [
                { "name": "Netflix", "renewalDate": "2026-10-25", "cost": 15.49, "category": "entertainment" },
                { "name": "Coursera", "renewalDate": "2026-10-28", "price": 15.02 }
            ],
            "data": [
                { "category": "entertainment", "subscriptionsCount": 2, "countPercentage": "66.67",
                  "totalSpent": 27.48, "costPercentage": "64.66" },
                { "category": "education", "subscriptionsCount": 1, "countPercentage": "33.33",
                  "totalSpent": 15.02, "costPercentage": "35.34" }
            ]
        });
        let details: SpendingDetails = serde_json::from_value(json).unwrap();
        assert_eq!(details.total_subscriptions, 3);
        assert_eq!(details.active_subscriptions, 2);
        assert_eq!(details.upcoming_renewals[0].name, "Netflix");
        assert_eq!(details.upcoming_renewals[0].amount(), 15.49);
        assert_eq!(details.upcoming_renewals[1].cost, 0.0);
        assert_eq!(details.upcoming_renewals[1].amount(), 15.02);
        assert_eq!(serde_json::to_value(&details).unwrap()["activeSubscriptions"], 2);
        assert_eq!(details.data.len(), 2);
        assert_eq!(details.max_category_spend(), 27.48);
    }

    #[test]
    fn test_unknown_status_does_not_fail_the_list() {
        let json = serde_json::json!({ "data": [
            { "_id": "a1", "name": "Spotify", "category": "entertainment", "price": 11.99,
              "currency": "USD", "frequency": "monthly", "status": "active" },
            { "_id": "a2", "name": "Gym", "category": "health", "price": 30.0,
              "currency": "USD", "frequency": "monthly", "status": "paused" }
        ]});
        let body: DataEnvelope<Vec<Subscription>> = serde_json::from_value(json).unwrap();
        assert_eq!(body.data.len(), 2);
        assert_eq!(body.data[0].status, SubscriptionStatus::Active);
        assert_eq!(body.data[1].status, SubscriptionStatus::Unknown);
        assert_eq!(body.data[1].status.displayed(), SubscriptionStatus::Active);
        assert_eq!(SubscriptionStatus::Expired.displayed(), SubscriptionStatus::Expired);
    }

    #[test]
    fn test_max_category_spend_floor() {
        assert_eq!(SpendingDetails::default().max_category_spend(), 1.0);
    }
}
