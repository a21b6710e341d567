use crate::run_service::RunMode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStage {
    LoadingProject,
    CheckingCache,
    LoadingCachedResult,
    BuildingSystem,
    Solving,
    SavingResults,
    Completed,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolveProgress {
    pub iteration: Option<usize>,
    pub max_iterations: Option<usize>,
    pub residual_norm: Option<f64>,
    /// Sweep points solved so far, and the total
    pub points: Option<(usize, usize)>,
}

#[derive(Debug, Clone)]
pub struct RunProgressEvent {
    pub mode: RunMode,
    pub stage: RunStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
    pub solve: Option<SolveProgress>,
}

impl RunStage {
    pub fn label(&self) -> &'static str {
        match self {
            RunStage::LoadingProject => "loading",
            RunStage::CheckingCache => "cache",
            RunStage::LoadingCachedResult => "cached",
            RunStage::BuildingSystem => "build",
            RunStage::Solving => "solve",
            RunStage::SavingResults => "save",
            RunStage::Completed => "done",
        }
    }
}
