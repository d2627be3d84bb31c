use channelcast_core::{FfmpegState, ReportConfig};

/// A variable set in the environment of the spawned tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentVariable {
    pub name: String,
    pub value: String,
}

impl EnvironmentVariable {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// `FFREPORT=file=<path>:level=<n>`
    pub fn report(report: &ReportConfig) -> Self {
        Self::new(
            "FFREPORT",
            format!("file={}:level={}", report.path, report.level.numeric()),
        )
    }

    pub fn vaapi_driver(driver: &str) -> Self {
        Self::new("LIBVA_DRIVER_NAME", driver)
    }
}

/// Environment the session needs from its settings.
pub fn for_state(state: &FfmpegState, uses_vaapi_driver: bool) -> Vec<EnvironmentVariable> {
    let mut vars = Vec::new();
    if let Some(report) = &state.report {
        vars.push(EnvironmentVariable::report(report));
    }
    if uses_vaapi_driver
        && let Some(driver) = state.vaapi_driver.as_deref().filter(|d| !d.is_empty())
    {
        vars.push(EnvironmentVariable::vaapi_driver(driver));
    }
    vars
}

#[cfg(test)]
mod tests {
    use super::*;
    use channelcast_core::LogLevel;

    #[test]
    fn report_and_driver() {
        let state = FfmpegState {
            report: Some(ReportConfig {
                path: "/tmp/report.log".into(),
                level: LogLevel::Info,
            }),
            vaapi_driver: Some("radeonsi".into()),
            ..FfmpegState::default()
        };
        let vars = for_state(&state, true);
        assert_eq!(vars[0], EnvironmentVariable::new("FFREPORT", "file=/tmp/report.log:level=32"));
        assert_eq!(vars[1], EnvironmentVariable::new("LIBVA_DRIVER_NAME", "radeonsi"));
        assert_eq!(for_state(&state, false).len(), 1);
    }
}
