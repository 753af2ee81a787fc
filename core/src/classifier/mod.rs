pub mod adapter;
pub mod fixed;
pub mod logistic;

pub use adapter::{decide, ClassifierAdapter, Verdict, DEFAULT_ABNORMAL_THRESHOLD};
pub use fixed::FixedScorer;
pub use logistic::{LogisticScorer, LogisticWeights};
