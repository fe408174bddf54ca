//! Held-out evaluation: accuracy, per-class report, confusion matrix.

use espectro_core::Orientation;

/// Training run evaluation on the held-out partition.
#[derive(Debug, Clone)]
pub struct Metrics {
    /// Fraction of held-out examples predicted correctly.
    pub accuracy: f64,
    /// Per-class precision/recall/F1 table with macro and weighted averages.
    pub classification_report: String,
    /// Row-normalized confusion matrix: `[true][predicted]`, each non-empty
    /// row sums to 1.0.
    pub confusion_matrix: Vec<Vec<f64>>,
    /// False when training hit the iteration cap before the loss plateaued.
    pub converged: bool,
    pub n_iter: usize,
}

impl Metrics {
    /// Evaluate predictions against ground truth over the 3 orientation
    /// classes.
    pub fn evaluate(y_true: &[usize], y_pred: &[usize]) -> Self {
        let k = Orientation::ALL.len();
        let total = y_true.len();

        let mut counts = vec![vec![0usize; k]; k];
        for (&t, &p) in y_true.iter().zip(y_pred) {
            counts[t][p] += 1;
        }

        let correct: usize = (0..k).map(|c| counts[c][c]).sum();
        let accuracy = if total > 0 {
            correct as f64 / total as f64
        } else {
            0.0
        };

        let confusion_matrix = counts
            .iter()
            .map(|row| {
                let row_total: usize = row.iter().sum();
                row.iter()
                    .map(|&v| {
                        if row_total > 0 {
                            v as f64 / row_total as f64
                        } else {
                            0.0
                        }
                    })
                    .collect()
            })
            .collect();

        let classification_report = build_report(&counts, accuracy, total);

        Self {
            accuracy,
            classification_report,
            confusion_matrix,
            converged: true,
            n_iter: 0,
        }
    }
}

struct ClassScores {
    precision: f64,
    recall: f64,
    f1: f64,
    support: usize,
}

fn class_scores(counts: &[Vec<usize>], class: usize) -> ClassScores {
    let k = counts.len();
    let tp = counts[class][class];
    let predicted: usize = (0..k).map(|t| counts[t][class]).sum();
    let actual: usize = counts[class].iter().sum();

    let precision = if predicted > 0 {
        tp as f64 / predicted as f64
    } else {
        0.0
    };
    let recall = if actual > 0 {
        tp as f64 / actual as f64
    } else {
        0.0
    };
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    ClassScores {
        precision,
        recall,
        f1,
        support: actual,
    }
}

fn build_report(counts: &[Vec<usize>], accuracy: f64, total: usize) -> String {
    let mut report = String::new();
    report.push_str(&format!(
        "{:>14} {:>9} {:>9} {:>9} {:>9}\n\n",
        "", "precision", "recall", "f1-score", "support"
    ));

    let scores: Vec<ClassScores> = (0..counts.len())
        .map(|c| class_scores(counts, c))
        .collect();

    for (class, s) in Orientation::ALL.iter().zip(&scores) {
        report.push_str(&format!(
            "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}\n",
            class.report_name(),
            s.precision,
            s.recall,
            s.f1,
            s.support
        ));
    }

    let k = scores.len() as f64;
    let macro_p = scores.iter().map(|s| s.precision).sum::<f64>() / k;
    let macro_r = scores.iter().map(|s| s.recall).sum::<f64>() / k;
    let macro_f = scores.iter().map(|s| s.f1).sum::<f64>() / k;

    let (mut weighted_p, mut weighted_r, mut weighted_f) = (0.0, 0.0, 0.0);
    if total > 0 {
        for s in &scores {
            let w = s.support as f64 / total as f64;
            weighted_p += w * s.precision;
            weighted_r += w * s.recall;
            weighted_f += w * s.f1;
        }
    }

    report.push_str(&format!(
        "\n{:>14} {:>9} {:>9} {:>9.2} {:>9}\n",
        "accuracy", "", "", accuracy, total
    ));
    report.push_str(&format!(
        "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}\n",
        "macro avg", macro_p, macro_r, macro_f, total
    ));
    report.push_str(&format!(
        "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}\n",
        "weighted avg", weighted_p, weighted_r, weighted_f, total
    ));

    report
}
