//! Derivative-free optimization for model parameter estimation.

/// Outcome of a simplex minimization.
#[derive(Debug, Clone)]
pub struct SimplexResult {
    /// Best point found.
    pub point: Vec<f64>,
    /// Objective value at the best point.
    pub value: f64,
    /// Iterations performed.
    pub iterations: usize,
    /// Whether the simplex shrank below tolerance.
    pub converged: bool,
}

/// Nelder-Mead configuration.
#[derive(Debug, Clone)]
pub struct SimplexOptions {
    /// Iteration cap.
    pub max_iterations: usize,
    /// Convergence tolerance on the objective spread.
    pub tolerance: f64,
    /// Relative step used to seed the initial simplex.
    pub initial_step: f64,
}

impl Default for SimplexOptions {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            tolerance: 1e-8,
            initial_step: 0.05,
        }
    }
}

// Standard Nelder-Mead coefficients.
const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Minimize `objective` with a bounded Nelder-Mead simplex.
///
/// `bounds` clips every candidate vertex per dimension; pass `None` for an
/// unconstrained search.
pub fn minimize<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    options: SimplexOptions,
) -> SimplexResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return SimplexResult {
            point: vec![],
            value: f64::NAN,
            iterations: 0,
            converged: false,
        };
    }

    let clip = |point: &[f64]| -> Vec<f64> {
        match bounds {
            Some(bounds) => point
                .iter()
                .zip(bounds.iter())
                .map(|(&x, &(lo, hi))| x.clamp(lo, hi))
                .collect(),
            None => point.to_vec(),
        }
    };

    // Seed the simplex: the initial point plus one perturbed vertex per axis.
    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(clip(initial));
    for i in 0..n {
        let mut vertex = initial.to_vec();
        let step = if initial[i].abs() > 1e-10 {
            options.initial_step * initial[i].abs()
        } else {
            options.initial_step
        };
        vertex[i] += step;
        simplex.push(clip(&vertex));
    }
    let mut values: Vec<f64> = simplex.iter().map(|v| objective(v)).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < options.max_iterations {
        iterations += 1;

        // Order vertices best-first.
        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| {
            values[a]
                .partial_cmp(&values[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let best = order[0];
        let second_worst = order[n - 1];
        let worst = order[n];

        if (values[worst] - values[best]).abs() < options.tolerance {
            converged = true;
            break;
        }

        // Centroid of all but the worst vertex.
        let mut centroid = vec![0.0; n];
        for (i, vertex) in simplex.iter().enumerate() {
            if i != worst {
                for j in 0..n {
                    centroid[j] += vertex[j];
                }
            }
        }
        for c in &mut centroid {
            *c /= n as f64;
        }

        let move_from_centroid = |coef: f64, target: &[f64]| -> Vec<f64> {
            clip(
                &centroid
                    .iter()
                    .zip(target.iter())
                    .map(|(c, t)| c + coef * (t - c))
                    .collect::<Vec<f64>>(),
            )
        };

        let reflected = move_from_centroid(-REFLECT, &simplex[worst]);
        let reflected_value = objective(&reflected);

        if reflected_value < values[best] {
            // Try to expand past the reflection.
            let expanded = move_from_centroid(-EXPAND, &simplex[worst]);
            let expanded_value = objective(&expanded);
            if expanded_value < reflected_value {
                simplex[worst] = expanded;
                values[worst] = expanded_value;
            } else {
                simplex[worst] = reflected;
                values[worst] = reflected_value;
            }
            continue;
        }

        if reflected_value < values[second_worst] {
            simplex[worst] = reflected;
            values[worst] = reflected_value;
            continue;
        }

        // Contract toward the better of {worst, reflected}.
        let contracted = if reflected_value < values[worst] {
            move_from_centroid(-CONTRACT, &simplex[worst])
        } else {
            move_from_centroid(CONTRACT, &simplex[worst])
        };
        let contracted_value = objective(&contracted);
        if contracted_value < values[worst].min(reflected_value) {
            simplex[worst] = contracted;
            values[worst] = contracted_value;
            continue;
        }

        // Shrink everything toward the best vertex.
        let anchor = simplex[best].clone();
        for i in 0..=n {
            if i != best {
                for j in 0..n {
                    simplex[i][j] = anchor[j] + SHRINK * (simplex[i][j] - anchor[j]);
                }
                simplex[i] = clip(&simplex[i]);
                values[i] = objective(&simplex[i]);
            }
        }
    }

    let best = values
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);

    SimplexResult {
        point: simplex[best].clone(),
        value: values[best],
        iterations,
        converged,
    }
}
