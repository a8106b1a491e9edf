//=========================================================================
// Platform Service Boundary
//=========================================================================
//
// Optional client for a platform distribution service (store overlay,
// achievements). None ships with the engine; when absent every use site
// skips the call.
//
//=========================================================================

//=== ServiceEvent ========================================================

/// Events delivered by [`PlatformService::run_callbacks`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceEvent {
    /// The service confirmed an achievement unlock.
    AchievementUnlocked(String),

    /// The service overlay was shown (`true`) or hidden.
    OverlayToggled(bool),
}

//=== PlatformService Trait ===============================================

pub trait PlatformService {
    /// Service name used in logs.
    fn name(&self) -> &str;

    /// Pumps the service's callback queue. Called once per frame, first.
    fn run_callbacks(&mut self, events: &mut Vec<ServiceEvent>);

    /// Reports a milestone to the service.
    fn unlock_achievement(&mut self, id: &str);

    /// Disconnects from the service. Later calls do nothing.
    fn shutdown(&mut self);
}
