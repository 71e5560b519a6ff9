use thiserror::Error;

/// Why a company was skipped by a stage. None of these abort a run.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("filing not found at {0}")]
    MissingFiling(String),

    #[error("no HTML tables in document")]
    NoTables,

    #[error("no finance tables among {0} tables")]
    NoFinanceTables(usize),

    #[error("stage `{0}` produced no rows")]
    EmptyStage(&'static str),

    #[error("no inline XBRL facts")]
    NoXbrlFacts,
}
