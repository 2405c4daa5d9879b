use serde::Deserialize;

/// Settings the host editor hands to the resource loading subsystem. The
/// host owns where these come from (its settings file); this struct only
/// fixes the names and defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// When false, texture container expansion discards work silently.
    pub textures_enabled: bool,
    /// When true, descriptor allocation failure aborts the job instead of
    /// dropping the request.
    pub strict_resource_checking: bool,
    /// Width of the thread pool that runs job completion orchestration.
    pub job_scheduler_width: usize,
    /// Worker count for each pipeline input port.
    pub pipeline_port_parallelism: usize,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        ResourceConfig {
            textures_enabled: true,
            strict_resource_checking: false,
            job_scheduler_width: 4,
            pipeline_port_parallelism: 6,
        }
    }
}
