//! Static plan catalog for the pricing and subscription screens.

#[derive(Debug, Clone, Copy)]
pub struct PricingTier {
    pub name: &'static str,
    pub description: &'static str,
    pub monthly_price: f64,
    pub included_predictions: u32,
    /// Price per prediction beyond the included amount. `None` means no overage.
    pub overage_per_prediction: Option<f64>,
    pub features: &'static [&'static str],
    pub most_popular: bool,
}

impl PricingTier {
    /// Monthly bill for a given number of predictions.
    pub fn monthly_cost(&self, predictions: u32) -> Option<f64> {
        let extra = predictions.saturating_sub(self.included_predictions);
        if extra == 0 {
            return Some(self.monthly_price);
        }
        self.overage_per_prediction
            .map(|rate| self.monthly_price + f64::from(extra) * rate)
    }
}

pub const ANNUAL_DISCOUNT: f64 = 0.15;

pub const PRICING_TIERS: &[PricingTier] = &[
    PricingTier {
        name: "Free",
        description: "Get started and explore the core capabilities.",
        monthly_price: 0.0,
        included_predictions: 100,
        overage_per_prediction: None,
        features: &[
            "Full feature access (real-time quotes, charts, alerts)",
            "Community-only support",
        ],
        most_popular: false,
    },
    PricingTier {
        name: "Developer",
        description: "Perfect for individual developers and small projects.",
        monthly_price: 9.99,
        included_predictions: 750,
        overage_per_prediction: Some(0.025),
        features: &["Full feature access", "Email support"],
        most_popular: false,
    },
    PricingTier {
        name: "Growth",
        description: "Ideal for growing applications and teams needing more volume.",
        monthly_price: 49.99,
        included_predictions: 4_000,
        overage_per_prediction: Some(0.02),
        features: &[
            "Full feature access",
            "Higher API rate limits",
            "Priority email support",
        ],
        most_popular: true,
    },
    PricingTier {
        name: "Scale",
        description: "For high-volume applications and businesses requiring robust support.",
        monthly_price: 99.99,
        included_predictions: 10_000,
        overage_per_prediction: Some(0.015),
        features: &[
            "Full feature access",
            "Highest API rate limits",
            "Dedicated support channel",
        ],
        most_popular: false,
    },
];

#[derive(Debug, Clone, Copy)]
pub struct SubscriptionPlan {
    pub name: &'static str,
    pub price: &'static str,
    pub features: &'static [&'static str],
    pub limitations: &'static [&'static str],
    pub is_current: bool,
}

pub const SUBSCRIPTION_PLANS: &[SubscriptionPlan] = &[
    SubscriptionPlan {
        name: "Basic",
        price: "Free",
        features: &[
            "Real-time currency conversion",
            "Basic currency alerts",
            "Market news access",
            "Standard API access (100 requests/day)",
            "7-day historical data",
        ],
        limitations: &["No currency predictions", "Limited API endpoints"],
        is_current: true,
    },
    SubscriptionPlan {
        name: "Pro",
        price: "$29.99 per month",
        features: &[
            "Everything in Basic",
            "Currency predictions (7 days)",
            "Advanced analytics",
            "Custom alerts",
            "Premium API access (1,000 requests/day)",
            "30-day historical data",
            "Email support",
        ],
        limitations: &[],
        is_current: false,
    },
    SubscriptionPlan {
        name: "Enterprise",
        price: "$99.99 per month",
        features: &[
            "Everything in Pro",
            "Currency predictions (30 days)",
            "Anomaly detection",
            "Volatility analysis",
            "Unlimited API access",
            "Up to 1 year historical data",
            "Custom integrations",
            "Priority support",
        ],
        limitations: &[],
        is_current: false,
    },
];
