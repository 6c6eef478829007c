mod nucleotides;
mod index_range;
mod index_range_list;
mod constraint;
mod interaction;

pub use nucleotides::*;
pub use index_range::*;
pub use index_range_list::*;
pub use constraint::*;
pub use interaction::*;


/// Free energies are stored as integers in units of 1/100 kcal/mol, the
/// same resolution the usual nearest neighbor parameter sets ship with.
/// Divide by 100.0 for printing. If you ever want to change this, beware
/// that ED tables and the DP engines assume saturated addition against
/// E_INF instead of checked arithmetic.
pub type Energy = i32;

/// Sentinel for "no energy assigned / not feasible". Any sum involving
/// E_INF stays at E_INF (see [`e_sum`]).
pub const E_INF: Energy = i32::MAX / 2;

#[inline]
pub fn e_is_inf(e: Energy) -> bool {
    e >= E_INF
}

/// Saturated addition: E_INF is absorbing.
#[inline]
pub fn e_sum(a: Energy, b: Energy) -> Energy {
    if e_is_inf(a) || e_is_inf(b) {
        E_INF
    } else {
        a.saturating_add(b)
    }
}

/// kcal/mol to the internal integer scale. Truncates toward zero, the
/// precision cut the stored ED tables are defined with; a small epsilon
/// keeps text round-trips stable against float noise.
#[inline]
pub fn kcal_to_e(kcal: f64) -> Energy {
    let e = kcal * 100.0;
    let e = e + e.signum() * 1e-4;
    if e >= E_INF as f64 {
        E_INF
    } else {
        e as Energy
    }
}

#[inline]
pub fn e_to_kcal(e: Energy) -> f64 {
    e as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_e_sum_saturates() {
        assert_eq!(e_sum(100, -50), 50);
        assert_eq!(e_sum(E_INF, -50), E_INF);
        assert_eq!(e_sum(-50, E_INF), E_INF);
        assert!(e_is_inf(e_sum(E_INF, E_INF)));
    }

    #[test]
    fn test_kcal_roundtrip() {
        assert_eq!(kcal_to_e(-1.0), -100);
        assert_eq!(kcal_to_e(7.32074), 732);
        assert_eq!(kcal_to_e(0.9949492), 99);
        assert_eq!(e_to_kcal(-200), -2.0);
        assert_eq!(kcal_to_e(f64::INFINITY), E_INF);
    }
}
