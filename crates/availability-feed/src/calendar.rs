//! Fetch client for `search.calendarAvailability`.

use availability_engine::{BusyCalendar, ObservationWindow, RawBusyRecord};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::rpc::{FirstSample, RpcClient, RpcError};

const METHOD: &str = "search.calendarAvailability";

/// Wire format of the API's time-frame bounds, in the configured zone.
const TIME_FRAME_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Params {
    resource: i64,
    time_frame: TimeFrame,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TimeFrame {
    start_date: String,
    end_date: String,
}

/// One busy slot as returned by the booking API.
///
/// Fields are read loosely so a wrongly typed value drops only its own slot.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    #[serde(default)]
    pub start_date: Option<Value>,
    #[serde(default)]
    pub end_date: Option<Value>,
    /// Minutes of servicing after the booking. Anything but a number is ignored.
    #[serde(default)]
    pub refuel_time: Option<Value>,
}

impl From<Slot> for RawBusyRecord {
    fn from(slot: Slot) -> Self {
        RawBusyRecord {
            start: marker(slot.start_date),
            end: marker(slot.end_date),
            extension_minutes: slot.refuel_time.as_ref().and_then(Value::as_f64),
        }
    }
}

fn marker(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s),
        _ => None,
    }
}

/// Calendar backed by the booking API.
pub struct CalendarClient<'a> {
    rpc: &'a RpcClient,
    tz: Tz,
    sample: FirstSample,
}

impl<'a> CalendarClient<'a> {
    pub fn new(rpc: &'a RpcClient, tz: Tz, sample: FirstSample) -> Self {
        Self { rpc, tz, sample }
    }

    fn params(&self, resource_id: i64, window: &ObservationWindow) -> Params {
        Params {
            resource: resource_id,
            time_frame: TimeFrame {
                start_date: window
                    .start()
                    .with_timezone(&self.tz)
                    .format(TIME_FRAME_FORMAT)
                    .to_string(),
                end_date: window
                    .end()
                    .with_timezone(&self.tz)
                    .format(TIME_FRAME_FORMAT)
                    .to_string(),
            },
        }
    }
}

impl BusyCalendar for CalendarClient<'_> {
    type Error = RpcError;

    fn fetch(
        &mut self,
        resource_id: i64,
        window: &ObservationWindow,
    ) -> Result<Vec<RawBusyRecord>, RpcError> {
        let params = self.params(resource_id, window);
        let slots: Vec<Slot> = self.rpc.call(METHOD, &params, &mut self.sample)?;
        Ok(slots.into_iter().map(RawBusyRecord::from).collect())
    }
}
