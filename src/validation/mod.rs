//! Statistical validation: unit-root tests and residual diagnostics.

pub mod stationarity;

pub use residual_tests::{
    chi_squared_sf, jarque_bera, ljung_box, LjungBoxTest, NormalityTest, ResidualDiagnostics,
};
pub use stationarity::{
    adf_test, assess_stationarity, kpss_test, DifferencingRound, StationarityAssessment,
    UnitRootTest,
};
