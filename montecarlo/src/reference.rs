/// Small learning rate approximation of the stationary variance of the first
/// weight component for two inputs with unit variance and correlation `rho`:
/// `alpha * (1 - rho^2) / (8 * |rho|)`.
///
/// Goes to infinity as `rho` goes to zero, where there is no dominant
/// direction to converge to.
pub fn reference_variance(alpha: f64, rho: f64) -> f64 {
    alpha * (1.0 - rho * rho) / (8.0 * rho.abs())
}
