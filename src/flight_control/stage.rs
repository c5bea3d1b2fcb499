use strum_macros::{Display, EnumIter};

/// Values flowing through one fix cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Field {
    // Inputs from outside the pipeline
    Fix,
    TaskPlan,
    Trace,
    Warnings,
    Teammate,
    // Outputs of the stages
    LocalTime,
    TimeWarp,
    AirData,
    TaskProgress,
    WorkingBand,
    ActivePoint,
    FlightPhase,
    Statistics,
    VarioScale,
    TeammateInfo,
    Snapshot,
}

impl Field {
    /// Fields provided by the fix stream, the shared facades, the idle path or external setters.
    pub fn is_input(self) -> bool {
        matches!(self, Field::Fix | Field::TaskPlan | Field::Trace | Field::Warnings | Field::Teammate)
    }
}

/// Whether a stage reads a value of the running cycle or the one left by the previous cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Current(Field),
    Prior(Field),
}

/// One step of the fix pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Stage {
    LocalTime,
    AirData,
    TaskProgress,
    WorkingBand,
    TaskMode,
    FlightPhase,
    SlowDerived,
    Publish,
}

/// Execution order of the fix pipeline.
pub const PIPELINE: [Stage; 8] = [
    Stage::LocalTime,
    Stage::AirData,
    Stage::TaskProgress,
    Stage::WorkingBand,
    Stage::TaskMode,
    Stage::FlightPhase,
    Stage::SlowDerived,
    Stage::Publish,
];

impl Stage {
    pub fn reads(self) -> &'static [Access] {
        use Access::{Current, Prior};
        match self {
            Stage::LocalTime => &[Current(Field::Fix), Prior(Field::LocalTime)],
            Stage::AirData => &[Current(Field::Fix), Current(Field::TimeWarp)],
            Stage::TaskProgress => &[Current(Field::Fix), Current(Field::TaskPlan), Prior(Field::ActivePoint)],
            Stage::WorkingBand => &[Current(Field::Fix), Prior(Field::Statistics)],
            Stage::TaskMode => &[Current(Field::TaskProgress)],
            Stage::FlightPhase => &[
                Current(Field::Fix),
                Current(Field::AirData),
                Current(Field::TimeWarp),
                Current(Field::TaskProgress),
                Prior(Field::FlightPhase),
            ],
            Stage::SlowDerived => &[
                Current(Field::Fix),
                Current(Field::TimeWarp),
                Current(Field::Trace),
                Current(Field::Teammate),
            ],
            Stage::Publish => &[
                Current(Field::Fix),
                Current(Field::LocalTime),
                Current(Field::AirData),
                Current(Field::TaskProgress),
                Current(Field::WorkingBand),
                Current(Field::ActivePoint),
                Current(Field::FlightPhase),
                Current(Field::Statistics),
                Current(Field::VarioScale),
                Current(Field::TeammateInfo),
                Current(Field::Warnings),
            ],
        }
    }

    pub fn writes(self) -> &'static [Field] {
        match self {
            Stage::LocalTime => &[Field::LocalTime, Field::TimeWarp],
            Stage::AirData => &[Field::AirData],
            Stage::TaskProgress => &[Field::TaskProgress],
            Stage::WorkingBand => &[Field::WorkingBand],
            Stage::TaskMode => &[Field::ActivePoint],
            Stage::FlightPhase => &[Field::FlightPhase, Field::Statistics],
            Stage::SlowDerived => &[Field::VarioScale, Field::TeammateInfo],
            Stage::Publish => &[Field::Snapshot],
        }
    }
}
