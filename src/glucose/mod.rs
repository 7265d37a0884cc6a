pub mod classifier;
pub mod trend;

pub use classifier::{
    classify, classify_after_meal, classify_before_meal, AfterMealBand, BeforeMealBand,
    Classification, ClassifyError,
};
pub use trend::Trend;
