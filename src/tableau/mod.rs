//! Butcher tableaux: named methods, registry, validation, classification.

mod methods;

use crate::{Float, matrix::Matrix};

/// Named Runge-Kutta methods with registered coefficient tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    ExplicitEuler,
    RungeKutta4,
    BogackiShampine32,
    CashKarp54,
    DormandPrince54,
    Fehlberg54,
    ImplicitEuler,
    ImplicitMidpoint,
    LobattoIIIA21,
    LobattoIIIC21,
    RadauIA32,
    RadauIIA32,
    LobattoIIIA43,
    LobattoIIIC43,
    GaussLegendre42,
    RadauIA54,
    RadauIIA54,
    GaussLegendre63,
    LobattoIIIA65,
    LobattoIIIC65,
}

impl Method {
    /// All registered methods, in registry order.
    pub const ALL: [Method; 20] = [
        Method::ExplicitEuler,
        Method::RungeKutta4,
        Method::BogackiShampine32,
        Method::CashKarp54,
        Method::DormandPrince54,
        Method::Fehlberg54,
        Method::ImplicitEuler,
        Method::ImplicitMidpoint,
        Method::LobattoIIIA21,
        Method::LobattoIIIC21,
        Method::RadauIA32,
        Method::RadauIIA32,
        Method::LobattoIIIA43,
        Method::LobattoIIIC43,
        Method::GaussLegendre42,
        Method::RadauIA54,
        Method::RadauIIA54,
        Method::GaussLegendre63,
        Method::LobattoIIIA65,
        Method::LobattoIIIC65,
    ];

    /// Human-readable method name.
    pub fn name(self) -> &'static str {
        match self {
            Method::ExplicitEuler => "EXPLICIT_EULER",
            Method::RungeKutta4 => "RUNGE_KUTTA_4",
            Method::BogackiShampine32 => "BOGACKI_SHAMPINE_32",
            Method::CashKarp54 => "CASH_KARP_54",
            Method::DormandPrince54 => "DORMAND_PRINCE_54",
            Method::Fehlberg54 => "FEHLBERG_54",
            Method::ImplicitEuler => "IMPLICIT_EULER",
            Method::ImplicitMidpoint => "IMPLICIT_MIDPOINT",
            Method::LobattoIIIA21 => "LOBATTO_IIIA_21",
            Method::LobattoIIIC21 => "LOBATTO_IIIC_21",
            Method::RadauIA32 => "RADAU_IA_32",
            Method::RadauIIA32 => "RADAU_IIA_32",
            Method::LobattoIIIA43 => "LOBATTO_IIIA_43",
            Method::LobattoIIIC43 => "LOBATTO_IIIC_43",
            Method::GaussLegendre42 => "GAUSS_LEGENDRE_42",
            Method::RadauIA54 => "RADAU_IA_54",
            Method::RadauIIA54 => "RADAU_IIA_54",
            Method::GaussLegendre63 => "GAUSS_LEGENDRE_63",
            Method::LobattoIIIA65 => "LOBATTO_IIIA_65",
            Method::LobattoIIIC65 => "LOBATTO_IIIC_65",
        }
    }

    /// Inverse of [`Method::name`].
    pub fn from_name(name: &str) -> Option<Method> {
        Method::ALL.iter().copied().find(|m| m.name() == name)
    }
}

/// Coefficients of a Runge-Kutta method.
///
/// Immutable once constructed; validated by [`ButcherTableau::is_consistent`]
/// before a run starts.
#[derive(Debug, Clone)]
pub struct ButcherTableau {
    pub name: &'static str,
    /// Stage coupling matrix.
    pub a: Matrix,
    /// Weights for the new y-value.
    pub b: Vec<Float>,
    /// Weights for the new y-value of the embedded method (empty if none).
    pub b2: Vec<Float>,
    /// Intermediate time points as fractions of the step.
    pub c: Vec<Float>,
    /// Convergence order of the main method.
    pub order: usize,
    /// Convergence order of the embedded method (0 if none).
    pub order2: usize,
    /// Whether the method satisfies first-same-as-last.
    pub fsal: bool,
    /// Diagonal weight used by the embedded update and the error formula.
    pub gamma: Float,
}

impl ButcherTableau {
    /// Number of stages.
    pub fn stages(&self) -> usize {
        self.b.len()
    }

    /// Whether an embedded pair is available for error estimation.
    pub fn has_embedded(&self) -> bool {
        !self.b2.is_empty()
    }

    /// Structural consistency: square A matching b and c in size, and every
    /// row of A summing to the corresponding node within 1e-5.
    pub fn is_consistent(&self) -> bool {
        let n = self.b.len();
        if n != self.c.len() || n != self.a.nrows() || n != self.a.ncols() {
            return false;
        }
        if self.has_embedded() && self.b2.len() != n {
            return false;
        }
        for i in 0..n {
            if (self.a.row_sum(i) - self.c[i]).abs() > 1e-5 {
                return false;
            }
        }
        true
    }

    /// A method is explicit iff every diagonal entry of A is exactly zero.
    pub fn is_explicit(&self) -> bool {
        (0..self.stages()).all(|i| self.a[(i, i)] == 0.0)
    }

    /// Diagonally implicit: no stage couples to a later one, and at least
    /// one stage is implicit.
    pub fn is_dirk(&self) -> bool {
        let n = self.stages();
        for i in 0..n {
            for j in (i + 1)..n {
                if self.a[(i, j)] != 0.0 {
                    return false;
                }
            }
        }
        !self.is_explicit()
    }

    /// Singly diagonally implicit: diagonally implicit with one shared
    /// nonzero diagonal value.
    pub fn is_sdirk(&self) -> bool {
        if !self.is_dirk() {
            return false;
        }
        let g = self.a[(0, 0)];
        g != 0.0 && (1..self.stages()).all(|i| self.a[(i, i)] == g)
    }

    /// Coefficients of the integrated Lagrange basis on the nodes `c`:
    /// row j holds `w` such that `b_j(theta) = sum_m w[m] * theta^(m+1)`.
    ///
    /// For collocation methods `b_j(1) == b[j]`. Returns `None` when the
    /// nodes are not pairwise distinct (no interpolating polynomial exists).
    pub fn interpolation_weights(&self) -> Option<Vec<Vec<Float>>> {
        let c = &self.c;
        let n = c.len();
        for i in 0..n {
            for j in (i + 1)..n {
                if (c[i] - c[j]).abs() < 1e-12 {
                    return None;
                }
            }
        }
        let mut rows = Vec::with_capacity(n);
        for j in 0..n {
            // Numerator polynomial prod_{k != j} (s - c_k), low powers first.
            let mut poly = vec![1.0];
            let mut denom = 1.0;
            for (k, &ck) in c.iter().enumerate() {
                if k == j {
                    continue;
                }
                let mut next = vec![0.0; poly.len() + 1];
                for (m, &p) in poly.iter().enumerate() {
                    next[m] -= p * ck;
                    next[m + 1] += p;
                }
                poly = next;
                denom *= c[j] - ck;
            }
            // Integrate term by term and fold in the denominator.
            let row = poly
                .iter()
                .enumerate()
                .map(|(m, &p)| p / denom / (m as Float + 1.0))
                .collect();
            rows.push(row);
        }
        Some(rows)
    }

    /// Evaluate the inter/extrapolated weight functions at `theta`, giving
    /// `{ b_1(theta), b_2(theta), ... }`.
    pub fn project_b(&self, theta: Float) -> Option<Vec<Float>> {
        let weights = self.interpolation_weights()?;
        Some(
            weights
                .iter()
                .map(|row| {
                    let mut pow = theta;
                    let mut sum = 0.0;
                    for &w in row {
                        sum += w * pow;
                        pow *= theta;
                    }
                    sum
                })
                .collect(),
        )
    }
}

/// Immutable registry of all named tableaux, constructed once and passed by
/// reference into the engine.
pub struct Registry {
    tableaus: Vec<ButcherTableau>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            tableaus: Method::ALL.iter().map(|&m| methods::coefficients(m)).collect(),
        }
    }

    /// Coefficients of a registered method.
    pub fn get(&self, method: Method) -> &ButcherTableau {
        &self.tableaus[method as usize]
    }

    /// Names of all registered methods, in registry order.
    pub fn all_method_names(&self) -> Vec<&'static str> {
        self.tableaus.iter().map(|t| t.name).collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_registered_tableau_is_consistent() {
        let reg = Registry::new();
        for &m in Method::ALL.iter() {
            let tab = reg.get(m);
            assert!(tab.is_consistent(), "inconsistent tableau for {}", tab.name);
        }
    }

    #[test]
    fn registry_lists_every_method_name() {
        let reg = Registry::new();
        let names = reg.all_method_names();
        assert_eq!(names.len(), Method::ALL.len());
        assert!(names.contains(&"RADAU_IIA_54"));
        assert!(names.contains(&"EXPLICIT_EULER"));
    }

    #[test]
    fn method_names_round_trip() {
        for &m in Method::ALL.iter() {
            assert_eq!(Method::from_name(m.name()), Some(m));
        }
        assert_eq!(Method::from_name("NO_SUCH_METHOD"), None);
    }

    #[test]
    fn explicit_classification_checks_the_diagonal() {
        let reg = Registry::new();
        let explicit = [
            Method::ExplicitEuler,
            Method::RungeKutta4,
            Method::BogackiShampine32,
            Method::CashKarp54,
            Method::DormandPrince54,
            Method::Fehlberg54,
        ];
        for &m in Method::ALL.iter() {
            let expected = explicit.contains(&m);
            assert_eq!(
                reg.get(m).is_explicit(),
                expected,
                "wrong explicit classification for {}",
                m.name()
            );
        }
    }

    #[test]
    fn dirk_and_sdirk_classification() {
        let reg = Registry::new();
        assert!(reg.get(Method::ImplicitEuler).is_sdirk());
        assert!(reg.get(Method::ImplicitMidpoint).is_sdirk());
        // First stage explicit, second implicit: DIRK but not SDIRK.
        let lobatto = reg.get(Method::LobattoIIIA21);
        assert!(lobatto.is_dirk());
        assert!(!lobatto.is_sdirk());
        // Fully implicit coupling.
        assert!(!reg.get(Method::GaussLegendre42).is_dirk());
        // Explicit methods are not DIRK.
        assert!(!reg.get(Method::RungeKutta4).is_dirk());
    }

    #[test]
    fn gamma_is_the_first_implicit_diagonal_weight() {
        let reg = Registry::new();
        assert_eq!(reg.get(Method::ExplicitEuler).gamma, 0.0);
        assert_eq!(reg.get(Method::ImplicitMidpoint).gamma, 0.5);
        assert_eq!(reg.get(Method::LobattoIIIA21).gamma, 0.5);
        assert!((reg.get(Method::RadauIIA32).gamma - 5.0 / 12.0).abs() < 1e-15);
    }

    #[test]
    fn collocation_weights_at_one_reproduce_b() {
        let reg = Registry::new();
        for m in [
            Method::RadauIA32,
            Method::RadauIIA32,
            Method::RadauIIA54,
            Method::GaussLegendre42,
            Method::GaussLegendre63,
        ] {
            let tab = reg.get(m);
            let bt = tab.project_b(1.0).unwrap();
            for (i, (&bi, &pi)) in tab.b.iter().zip(bt.iter()).enumerate() {
                assert!(
                    (bi - pi).abs() < 1e-10,
                    "{}: b[{}] = {} but b({}) = {}",
                    tab.name,
                    i,
                    bi,
                    1.0,
                    pi
                );
            }
        }
    }

    #[test]
    fn duplicate_nodes_have_no_interpolant() {
        let reg = Registry::new();
        // RK4 repeats c = 0.5, so no interpolating polynomial exists.
        assert!(reg.get(Method::RungeKutta4).project_b(0.5).is_none());
    }
}
