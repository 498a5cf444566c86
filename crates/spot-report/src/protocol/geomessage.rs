use nom::{
    character::complete::char, combinator::all_consuming, number::complete::double,
    sequence::separated_pair, Finish, IResult,
};
use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    Reader, Writer,
};
use tracing::trace;

use crate::{
    coord::Location,
    model::SpotReport,
    time::parse_timestamp,
    Error, SRResult,
};

/// Geomessage XML, as understood by the listening clients.
///
/// A document is a `geomessages` element holding one `geomessage` element (carrying the format
/// version in its `v` attribute). All message content is flat text child elements of
/// `geomessage`, in a fixed order chosen by the producer:
///
/// ```xml
/// <geomessages>
///   <geomessage v="1.1">
///     <geomessagetype>spot_report</geomessagetype>
///     <id>{...}</id>
///     ...
///   </geomessage>
/// </geomessages>
/// ```
pub const GEOMESSAGES_TAG: &str = "geomessages";
pub const GEOMESSAGE_TAG: &str = "geomessage";
pub const VERSION_ATTR: &str = "v";
pub const VERSION: &str = "1.1";

pub const TYPE_FIELD_NAME: &str = "geomessagetype";
pub const ID_FIELD_NAME: &str = "id";
pub const WKID_FIELD_NAME: &str = "wkid";
pub const CONTROL_POINTS_FIELD_NAME: &str = "controlpoints";
pub const ACTION_FIELD_NAME: &str = "action";
pub const UNIQUE_DESIGNATION_FIELD_NAME: &str = "uniquedesignation";

/// Action value for reports that add or replace a symbol.
pub const ACTION_UPDATE: &str = "update";

// SALUTE fields of a spot report
pub const SIZE_FIELD_NAME: &str = "size";
pub const ACTIVITY_FIELD_NAME: &str = "activity";
pub const LOCATION_FIELD_NAME: &str = "location";
pub const UNIT_FIELD_NAME: &str = "unit";
pub const EQUIPMENT_FIELD_NAME: &str = "equipment";
pub const SIZE_CAT_FIELD_NAME: &str = "size_cat";
pub const ACTIVITY_CAT_FIELD_NAME: &str = "activity_cat";
pub const UNIT_CAT_FIELD_NAME: &str = "unit_cat";
pub const EQUIP_CAT_FIELD_NAME: &str = "equip_cat";
pub const TIME_OBSERVED_FIELD_NAME: &str = "timeobserved";
pub const DATETIME_SUBMITTED_FIELD_NAME: &str = "datetimesubmitted";

/// One message: version plus ordered `(name, value)` fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Geomessage {
    version: String,
    fields: Vec<(String, String)>,
}

/// Appends fields in order; nothing is rendered until [`Geomessage::to_xml`].
#[derive(Debug, Default)]
pub struct GeomessageBuilder {
    fields: Vec<(String, String)>,
}

impl GeomessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &str, value: impl ToString) -> Self {
        self.fields.push((name.to_string(), value.to_string()));
        self
    }

    /// Append the field only when `value` is present. Absent values are omitted, not emitted
    /// empty.
    pub fn field_opt<T: ToString>(self, name: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.field(name, v),
            None => self,
        }
    }

    pub fn build(self) -> Geomessage {
        Geomessage {
            version: VERSION.to_string(),
            fields: self.fields,
        }
    }
}

fn xml_err(e: impl std::fmt::Display) -> Error {
    Error::Xml(e.to_string())
}

fn utf8(raw: &[u8]) -> SRResult<String> {
    std::str::from_utf8(raw).map(str::to_string).map_err(xml_err)
}

impl Geomessage {
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// First value of the named field.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn require(&self, name: &str) -> SRResult<&str> {
        self.get(name)
            .ok_or_else(|| Error::ParseError(format!("missing field {name:?}")))
    }

    /// Render the full document, including XML declaration, in one pass.
    pub fn to_xml(&self) -> SRResult<String> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_err)?;
        writer
            .write_event(Event::Start(BytesStart::new(GEOMESSAGES_TAG)))
            .map_err(xml_err)?;
        let mut start = BytesStart::new(GEOMESSAGE_TAG);
        start.push_attribute((VERSION_ATTR, self.version.as_str()));
        writer.write_event(Event::Start(start)).map_err(xml_err)?;
        for (name, value) in &self.fields {
            writer
                .write_event(Event::Start(BytesStart::new(name.as_str())))
                .map_err(xml_err)?;
            writer
                .write_event(Event::Text(BytesText::new(value)))
                .map_err(xml_err)?;
            writer
                .write_event(Event::End(BytesEnd::new(name.as_str())))
                .map_err(xml_err)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(GEOMESSAGE_TAG)))
            .map_err(xml_err)?;
        writer
            .write_event(Event::End(BytesEnd::new(GEOMESSAGES_TAG)))
            .map_err(xml_err)?;
        String::from_utf8(writer.into_inner()).map_err(xml_err)
    }

    /// Parse the first `geomessage` in a document. The `geomessages` wrapper is optional.
    pub fn from_xml(xml: &str) -> SRResult<Self> {
        let mut reader = Reader::from_str(xml);
        let mut partial = PartialMessage::default();

        loop {
            match reader.read_event().map_err(xml_err)? {
                Event::Start(e) => partial.open(&e, false)?,
                Event::Empty(e) => {
                    partial.open(&e, true)?;
                    if partial.done {
                        break;
                    }
                }
                Event::Text(t) => {
                    if let Some((_, value)) = partial.field.as_mut() {
                        value.push_str(&t.unescape().map_err(xml_err)?);
                    }
                }
                Event::CData(t) => {
                    if let Some((_, value)) = partial.field.as_mut() {
                        value.push_str(&utf8(&t)?);
                    }
                }
                Event::End(_) => {
                    partial.close();
                    if partial.done {
                        break;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        let version = partial
            .version
            .ok_or_else(|| Error::Xml(format!("no <{GEOMESSAGE_TAG}> element")))?;
        let fields = partial.fields;
        trace!("parsed geomessage v{} with {} fields", version, fields.len());
        Ok(Self { version, fields })
    }
}

/// Reader state while walking a document. `version` is set once inside `geomessage`, `field`
/// while inside one of its children.
#[derive(Default)]
struct PartialMessage {
    version: Option<String>,
    fields: Vec<(String, String)>,
    field: Option<(String, String)>,
    done: bool,
}

impl PartialMessage {
    fn open(&mut self, e: &BytesStart<'_>, empty: bool) -> SRResult<()> {
        let name = utf8(e.name().as_ref())?;
        if self.version.is_none() {
            if name == GEOMESSAGE_TAG {
                let v = match e.try_get_attribute(VERSION_ATTR).map_err(xml_err)? {
                    Some(attr) => attr.unescape_value().map_err(xml_err)?.into_owned(),
                    None => VERSION.to_string(),
                };
                self.version = Some(v);
                self.done = empty;
            } else if name != GEOMESSAGES_TAG {
                return Err(Error::Xml(format!("unexpected element <{name}>")));
            }
            return Ok(());
        }
        if let Some((outer, _)) = &self.field {
            return Err(Error::Xml(format!(
                "nested element <{name}> inside <{outer}>"
            )));
        }
        if empty {
            self.fields.push((name, String::new()));
        } else {
            self.field = Some((name, String::new()));
        }
        Ok(())
    }

    fn close(&mut self) {
        match self.field.take() {
            Some(f) => self.fields.push(f),
            None => self.done = self.version.is_some(),
        }
    }
}

fn nom_control_points(input: &str) -> IResult<&str, (f64, f64)> {
    all_consuming(separated_pair(double, char(','), double))(input)
}

/// Parse single-point control points, `x,y`.
pub fn parse_control_points(s: &str) -> SRResult<(f64, f64)> {
    let (_, pt) = nom_control_points(s.trim()).finish()?;
    Ok(pt)
}

fn parse_field<T>(msg: &Geomessage, name: &str) -> SRResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = msg.require(name)?;
    raw.trim()
        .parse()
        .map_err(|e| Error::ParseError(format!("{name} {raw:?}: {e}")))
}

impl SpotReport {
    /// Rebuild a report from a received message. Categories are read from their codes, the
    /// labels and grid reference are informational only.
    pub fn from_geomessage(msg: &Geomessage) -> SRResult<Self> {
        let (x, y) = parse_control_points(msg.require(CONTROL_POINTS_FIELD_NAME)?)?;
        let time = msg
            .get(TIME_OBSERVED_FIELD_NAME)
            .map(parse_timestamp)
            .transpose()?;
        Ok(Self {
            message_id: msg.require(ID_FIELD_NAME)?.to_string(),
            time,
            location: Location::new(x, y, parse_field(msg, WKID_FIELD_NAME)?),
            size: parse_field(msg, SIZE_CAT_FIELD_NAME)?,
            activity: parse_field(msg, ACTIVITY_CAT_FIELD_NAME)?,
            unit: parse_field(msg, UNIT_CAT_FIELD_NAME)?,
            equipment: parse_field(msg, EQUIP_CAT_FIELD_NAME)?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lazy_init_tracing;

    #[test]
    fn test_builder_keeps_order_and_skips_absent() {
        let msg = GeomessageBuilder::new()
            .field(TYPE_FIELD_NAME, "spot_report")
            .field_opt(UNIQUE_DESIGNATION_FIELD_NAME, None::<&str>)
            .field(ID_FIELD_NAME, "{abc}")
            .field_opt(ACTION_FIELD_NAME, Some(ACTION_UPDATE))
            .field(WKID_FIELD_NAME, 4326)
            .build();
        let names: Vec<&str> = msg.fields().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, [TYPE_FIELD_NAME, ID_FIELD_NAME, ACTION_FIELD_NAME, WKID_FIELD_NAME]);
        assert_eq!(msg.get(WKID_FIELD_NAME), Some("4326"));
        assert_eq!(msg.get(UNIQUE_DESIGNATION_FIELD_NAME), None);
        assert_eq!(msg.version(), VERSION);
    }

    #[test]
    fn test_to_xml_layout() {
        let xml = GeomessageBuilder::new()
            .field(ID_FIELD_NAME, "42")
            .field(ACTION_FIELD_NAME, ACTION_UPDATE)
            .build()
            .to_xml()
            .unwrap();
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <geomessages><geomessage v=\"1.1\">\
             <id>42</id><action>update</action>\
             </geomessage></geomessages>"
        );
    }

    #[test]
    fn test_to_xml_escapes_text() {
        let xml = GeomessageBuilder::new()
            .field(UNIQUE_DESIGNATION_FIELD_NAME, "A&B <1>")
            .build()
            .to_xml()
            .unwrap();
        assert!(xml.contains("<uniquedesignation>A&amp;B &lt;1&gt;</uniquedesignation>"));
    }

    #[test]
    fn test_from_xml_reads_back_rendered_fields() {
        lazy_init_tracing();
        let msg = GeomessageBuilder::new()
            .field(ID_FIELD_NAME, "{id}")
            .field(UNIQUE_DESIGNATION_FIELD_NAME, "A&B")
            .field(CONTROL_POINTS_FIELD_NAME, "34.5,-117.2")
            .build();
        let parsed = Geomessage::from_xml(&msg.to_xml().unwrap()).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_from_xml_tolerates_whitespace_and_bare_message() {
        let xml = r#"
            <geomessage v="1.0">
              <id>7</id>
              <action/>
            </geomessage>"#;
        let msg = Geomessage::from_xml(xml).unwrap();
        assert_eq!(msg.version(), "1.0");
        assert_eq!(msg.get(ID_FIELD_NAME), Some("7"));
        assert_eq!(msg.get(ACTION_FIELD_NAME), Some(""));
    }

    #[test]
    fn test_from_xml_rejects_nesting_and_foreign_roots() {
        let nested = "<geomessages><geomessage><id><x>1</x></id></geomessage></geomessages>";
        assert!(matches!(Geomessage::from_xml(nested), Err(Error::Xml(_))));
        let nested_empty = "<geomessages><geomessage><id><x/>1</id></geomessage></geomessages>";
        let err = Geomessage::from_xml(nested_empty).unwrap_err();
        assert!(err.to_string().contains("nested element <x> inside <id>"), "{err}");
        let foreign = "<event><point/></event>";
        assert!(matches!(Geomessage::from_xml(foreign), Err(Error::Xml(_))));
        assert!(matches!(Geomessage::from_xml(""), Err(Error::Xml(_))));
    }

    #[test]
    fn test_from_xml_self_closing_message() {
        let xml = r#"<geomessages><geomessage v="1.1"/></geomessages>"#;
        let msg = Geomessage::from_xml(xml).unwrap();
        assert_eq!(msg.version(), "1.1");
        assert!(msg.fields().is_empty());

        let bare = Geomessage::from_xml("<geomessage/>").unwrap();
        assert_eq!(bare.version(), VERSION);
        assert!(bare.fields().is_empty());
    }

    #[test]
    fn test_parse_control_points() {
        assert_eq!(parse_control_points("34.5,-117.2").unwrap(), (34.5, -117.2));
        assert_eq!(parse_control_points(" 0,0 ").unwrap(), (0.0, 0.0));
        assert!(matches!(
            parse_control_points("34.5;-117.2"),
            Err(Error::ParseError(_))
        ));
        assert!(matches!(
            parse_control_points("1,2,3"),
            Err(Error::ParseError(_))
        ));
    }

    #[test]
    fn test_spot_report_from_geomessage_missing_field() {
        let msg = GeomessageBuilder::new()
            .field(ID_FIELD_NAME, "{id}")
            .field(CONTROL_POINTS_FIELD_NAME, "1,2")
            .build();
        let err = SpotReport::from_geomessage(&msg).unwrap_err();
        assert!(err.to_string().contains(WKID_FIELD_NAME), "{err}");
    }
}
