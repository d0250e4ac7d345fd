use std::fmt;
use std::path::PathBuf;

use crate::layout::ArtifactLayout;

/// Overall verdict of an orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Every required and optional artifact exists.
    Verified,
    /// Every required artifact exists; some optional ones are missing.
    PartiallyVerified,
    /// Execution failed, or a required artifact is missing.
    Failed,
}

impl Verdict {
    /// Process exit code for this verdict. `strict` treats a partial
    /// verification as a failure.
    pub fn exit_code(self, strict: bool) -> i32 {
        match self {
            Verdict::Verified => 0,
            Verdict::PartiallyVerified if !strict => 0,
            Verdict::PartiallyVerified | Verdict::Failed => 1,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Verified => write!(f, "verified"),
            Verdict::PartiallyVerified => write!(f, "partially verified"),
            Verdict::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactCheck {
    pub path: PathBuf,
    pub required: bool,
    pub present: bool,
}

/// Presence of every expected artifact after execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactVerification {
    pub checks: Vec<ArtifactCheck>,
}

impl ArtifactVerification {
    pub fn required_ok(&self) -> bool {
        self.checks.iter().filter(|c| c.required).all(|c| c.present)
    }

    pub fn all_present(&self) -> bool {
        self.checks.iter().all(|c| c.present)
    }

    pub fn missing(&self) -> impl Iterator<Item = &ArtifactCheck> {
        self.checks.iter().filter(|c| !c.present)
    }

    pub fn verdict(&self) -> Verdict {
        if !self.required_ok() {
            Verdict::Failed
        } else if self.all_present() {
            Verdict::Verified
        } else {
            Verdict::PartiallyVerified
        }
    }
}

/// Check which required and optional artifacts exist under `layout`.
pub fn verify_artifacts(layout: &ArtifactLayout) -> ArtifactVerification {
    let required = layout.required_artifacts().into_iter().map(|p| (p, true));
    let optional = layout.optional_artifacts().into_iter().map(|p| (p, false));

    let checks = required
        .chain(optional)
        .map(|(path, required)| {
            let present = path.exists();
            match (present, required) {
                (true, _) => tracing::info!(path = %path.display(), "artifact present"),
                (false, true) => {
                    tracing::error!(path = %path.display(), "required artifact missing")
                }
                (false, false) => {
                    tracing::warn!(path = %path.display(), "optional artifact missing")
                }
            }
            ArtifactCheck {
                path,
                required,
                present,
            }
        })
        .collect();

    ArtifactVerification { checks }
}
