/// Marker expected in the manufacturer part of the `*IDN?` response.
pub const VENDOR_MARKER: &str = "OWON";
/// Marker expected in the model part of the `*IDN?` response.
pub const FAMILY_MARKER: &str = "XDM1";

/// Parsed `*IDN?` response, e.g. `OWON,XDM1041,1543210,V4.3.0,3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub raw: String,
    pub manufacturer: String,
    pub model: String,
    pub serial: String,
    pub firmware: Option<String>,
    /// Response mentions [`VENDOR_MARKER`] (case-insensitive).
    pub vendor_match: bool,
    /// Response mentions [`FAMILY_MARKER`] (case-insensitive).
    pub family_match: bool,
}

impl Identity {
    /// Parse an identity line. Requires at least manufacturer, model and
    /// serial number fields.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let mut fields = raw.split(',').map(str::trim);
        let manufacturer = fields.next()?;
        let model = fields.next()?;
        let serial = fields.next()?;
        let firmware = fields
            .next()
            .filter(|f| !f.is_empty())
            .map(ToOwned::to_owned);

        let upper = raw.to_ascii_uppercase();
        Some(Self {
            raw: raw.to_string(),
            manufacturer: manufacturer.to_string(),
            model: model.to_string(),
            serial: serial.to_string(),
            firmware,
            vendor_match: upper.contains(VENDOR_MARKER),
            family_match: upper.contains(FAMILY_MARKER),
        })
    }

    /// Both vendor and model family markers are present.
    pub fn is_supported(&self) -> bool {
        self.vendor_match && self.family_match
    }
}
