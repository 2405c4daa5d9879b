/// The FromSoftware titles the editor understands. Controls which binder
/// dialect the archive reader speaks and which decode paths are taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameFamily {
    DemonsSouls,
    DarkSouls1Ptde,
    DarkSouls1Remaster,
    DarkSouls2,
    DarkSouls3,
    Bloodborne,
    Sekiro,
    EldenRing,
    ArmoredCore4,
    ArmoredCoreFa,
    ArmoredCoreV,
    ArmoredCoreVd,
    ArmoredCore6,
}

impl GameFamily {
    /// The older binder generation. Everything newer uses the v4 dialect.
    pub fn uses_legacy_binders(self) -> bool {
        matches!(
            self,
            GameFamily::DemonsSouls
                | GameFamily::DarkSouls1Ptde
                | GameFamily::DarkSouls1Remaster
                | GameFamily::ArmoredCoreV
                | GameFamily::ArmoredCoreVd
        )
    }
}
