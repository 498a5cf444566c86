/// Broadcasts spot reports as Geomessages.
use tracing::{debug, trace};

use crate::{
    config::Config,
    coord::GridReference,
    model::{IdGenerator, SpotReport, UuidGenerator},
    protocol::{geomessage::*, OutboundTypes, SPOT_REPORT_TYPE},
    time::{format_timestamp, Clock, SystemClock},
    transport::MessageSink,
    SRResult,
};

/// Outcome of a send: the report exactly as transmitted.
#[derive(Debug, Clone, PartialEq)]
pub struct Sent {
    pub report: SpotReport,
    /// True when the transmitted report carries a new message ID.
    pub id_regenerated: bool,
}

/// Serializes spot reports and hands them to a [`MessageSink`].
///
/// The grid-reference converter `G` (the map controller) turns report coordinates into the
/// `location` field. IDs and "now" come from injectable sources so output can be pinned in tests.
pub struct SpotReportSender<G, S> {
    grid: G,
    sink: S,
    ids: Box<dyn IdGenerator>,
    clock: Box<dyn Clock>,
    types: OutboundTypes,
    unique_designation: Option<String>,
}

impl<G, S> SpotReportSender<G, S>
where
    G: GridReference,
    S: MessageSink,
{
    pub fn new(grid: G, sink: S) -> Self {
        Self {
            grid,
            sink,
            ids: Box::new(UuidGenerator),
            clock: Box::new(SystemClock),
            types: OutboundTypes::default(),
            unique_designation: None,
        }
    }

    /// Sender with outbound type names and unique designation taken from `config`.
    pub fn from_config(grid: G, sink: S, config: &Config) -> Self {
        Self::new(grid, sink)
            .with_outbound_types(OutboundTypes::from(config))
            .with_unique_designation(config.unique_designation.clone())
    }

    pub fn with_id_generator(mut self, ids: Box<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_outbound_types(mut self, types: OutboundTypes) -> Self {
        self.types = types;
        self
    }

    /// Designation used by [`Self::send_report`].
    pub fn with_unique_designation(mut self, designation: Option<String>) -> Self {
        self.unique_designation = designation;
        self
    }

    pub fn unique_designation(&self) -> Option<&str> {
        self.unique_designation.as_deref()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Send `report` as a new spot report, i.e. with a freshly generated message ID.
    pub fn send(
        &mut self,
        report: Option<&SpotReport>,
        sender: Option<&str>,
    ) -> SRResult<Option<Sent>> {
        self.send_with(report, sender, false)
    }

    /// Send `report`. Unless `is_update`, the transmitted copy gets a new message ID so listeners
    /// treat it as a distinct report; with `is_update` the existing ID is kept and listeners
    /// replace the earlier report.
    ///
    /// A `None` report is ignored. The caller's record is never modified; the returned [`Sent`]
    /// holds what went out.
    pub fn send_with(
        &mut self,
        report: Option<&SpotReport>,
        sender: Option<&str>,
        is_update: bool,
    ) -> SRResult<Option<Sent>> {
        let Some(report) = report else {
            debug!("no spot report to send");
            return Ok(None);
        };
        let mut report = report.clone();
        if !is_update {
            report.regenerate_message_id(&*self.ids);
        }
        let msg = self.to_message_string(&report, sender)?;
        debug!("sending spot report {} ({} bytes)", report.message_id, msg.len());
        self.sink.send_bytes(msg.as_bytes())?;
        Ok(Some(Sent {
            report,
            id_regenerated: !is_update,
        }))
    }

    /// [`Self::send_with`] as the configured unique designation, if any.
    pub fn send_report(
        &mut self,
        report: Option<&SpotReport>,
        is_update: bool,
    ) -> SRResult<Option<Sent>> {
        let designation = self.unique_designation.clone();
        self.send_with(report, designation.as_deref(), is_update)
    }

    /// Same as [`Self::send_with`], but writes a regenerated ID back into `report`.
    pub fn send_in_place(
        &mut self,
        report: &mut SpotReport,
        sender: Option<&str>,
        is_update: bool,
    ) -> SRResult<()> {
        if let Some(sent) = self.send_with(Some(&*report), sender, is_update)? {
            report.message_id = sent.report.message_id;
        }
        Ok(())
    }

    /// Build the Geomessage for `report`. `sender` becomes the `uniquedesignation` field, which
    /// is left out entirely when `None`.
    pub fn to_geomessage(&self, report: &SpotReport, sender: Option<&str>) -> SRResult<Geomessage> {
        let now = self.clock.now();
        let observed = report.time.unwrap_or(now);
        let loc = &report.location;
        let grid_ref = self.grid.point_to_grid_reference(loc.x, loc.y, loc.wkid)?;

        let msg = GeomessageBuilder::new()
            .field(TYPE_FIELD_NAME, self.types.outbound_name(SPOT_REPORT_TYPE))
            .field(ID_FIELD_NAME, &report.message_id)
            .field(WKID_FIELD_NAME, loc.wkid)
            .field(CONTROL_POINTS_FIELD_NAME, loc.control_points())
            .field(ACTION_FIELD_NAME, ACTION_UPDATE)
            .field_opt(UNIQUE_DESIGNATION_FIELD_NAME, sender)
            // salute labels
            .field(SIZE_FIELD_NAME, report.size)
            .field(ACTIVITY_FIELD_NAME, report.activity)
            .field(LOCATION_FIELD_NAME, grid_ref)
            .field(UNIT_FIELD_NAME, report.unit)
            .field(EQUIPMENT_FIELD_NAME, report.equipment)
            // salute codes
            .field(SIZE_CAT_FIELD_NAME, report.size.code())
            .field(ACTIVITY_CAT_FIELD_NAME, report.activity.code())
            .field(UNIT_CAT_FIELD_NAME, report.unit.code())
            .field(EQUIP_CAT_FIELD_NAME, report.equipment.code())
            .field(TIME_OBSERVED_FIELD_NAME, format_timestamp(&observed))
            .field(DATETIME_SUBMITTED_FIELD_NAME, format_timestamp(&now))
            .build();
        Ok(msg)
    }

    /// Serialized form of [`Self::to_geomessage`]. Nothing is sent.
    pub fn to_message_string(&self, report: &SpotReport, sender: Option<&str>) -> SRResult<String> {
        let xml = self.to_geomessage(report, sender)?.to_xml()?;
        trace!("spot report xml: {}", xml);
        Ok(xml)
    }
}
