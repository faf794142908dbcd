use std::collections::VecDeque;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use nmea0183::ParseResult;
use tracing::{debug, trace};

use crate::{MessageHandler, NmeaFrame};

const MILLIS_PER_DAY: i64 = 86_400_000;
const KNOTS_TO_MPS: f64 = 1852.0 / 3600.0;

/// One position fix merged from every sentence reported for the same UTC time
#[derive(Debug, Clone, PartialEq)]
pub struct Fix {
    pub time: Option<NaiveTime>,
    /// UTC timestamp of the fix time. Until an RMC sentence supplies the
    /// date, the date is the UTC date the stream was first seen on.
    pub timestamp: Option<DateTime<Utc>>,
    pub has_fix: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,     // meters
    pub course_deg: Option<f64>,   // true
    pub speed_mps: Option<f64>,
    pub vertical_speed_mps: Option<f64>,
    pub hdop: Option<f64>,
    pub num_satellites: Option<u8>,
}

#[derive(Debug, Default)]
struct Epoch {
    time: Option<NaiveTime>,
    rmc_valid: Option<bool>,
    gga_fix: Option<bool>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    altitude: Option<f64>,
    course_deg: Option<f64>,
    speed_mps: Option<f64>,
    hdop: Option<f64>,
    num_satellites: Option<u8>,
}

impl Epoch {
    fn starting_at(time: NaiveTime) -> Self {
        Self {
            time: Some(time),
            ..Default::default()
        }
    }

    fn has_data(&self) -> bool {
        self.time.is_some()
            || self.latitude.is_some()
            || self.speed_mps.is_some()
            || self.reports_no_fix()
    }

    /// The receiver said it has no fix; such sentences carry no usable time
    fn reports_no_fix(&self) -> bool {
        self.rmc_valid == Some(false) || self.gga_fix == Some(false)
    }

    fn has_fix(&self) -> bool {
        // RMC status wins over the GGA quality indicator
        self.rmc_valid.or(self.gga_fix).unwrap_or(false)
    }
}

fn utc_time(hours: u32, minutes: u32, seconds: f64) -> Option<NaiveTime> {
    let millis = (seconds * 1000.0).round() as u32;
    NaiveTime::from_hms_milli_opt(hours, minutes, millis / 1000, millis % 1000)
}

fn utc_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    // two digit years are 2000-based
    let year = if year < 100 { year + 2000 } else { year };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Groups RMC, GGA and VTG sentences into fixes.
///
/// Receivers report one burst of sentences per epoch; a fix is complete when
/// a sentence with a different UTC time arrives, or when the stream ends
/// (see [`FixAssembler::flush`]).
pub struct FixAssembler {
    current: Option<Epoch>,
    date: Option<NaiveDate>,
    last_emitted: Option<(NaiveDate, NaiveTime)>,
    last_altitude: Option<(NaiveTime, f64)>,
    ready: VecDeque<Fix>,
}

impl FixAssembler {
    pub fn new() -> Self {
        Self {
            current: None,
            date: None,
            last_emitted: None,
            last_altitude: None,
            ready: VecDeque::new(),
        }
    }

    /// Take the oldest completed fix, if any
    pub fn pop_fix(&mut self) -> Option<Fix> {
        self.ready.pop_front()
    }

    /// Complete the epoch in progress (end of stream)
    pub fn flush(&mut self) -> Option<Fix> {
        self.finish_epoch();
        self.pop_fix()
    }

    fn epoch_for(&mut self, time: Option<NaiveTime>) -> &mut Epoch {
        if let Some(time) = time {
            let starts_new = match &self.current {
                Some(epoch) => epoch.time.map_or(epoch.reports_no_fix(), |current| current != time),
                None => true,
            };
            if starts_new {
                self.finish_epoch();
                self.current = Some(Epoch::starting_at(time));
            }
        }
        let epoch = self.current.get_or_insert_with(Epoch::default);
        if epoch.time.is_none() {
            epoch.time = time;
        }
        epoch
    }

    /// Epoch for a no-fix report. It never joins an epoch that has a time.
    fn no_fix_epoch(&mut self) -> &mut Epoch {
        if self.current.as_ref().is_some_and(|epoch| epoch.time.is_some()) {
            self.finish_epoch();
        }
        self.current.get_or_insert_with(Epoch::default)
    }

    fn finish_epoch(&mut self) {
        let Some(epoch) = self.current.take() else {
            return;
        };
        if !epoch.has_data() {
            return;
        }

        if epoch.time.is_some() && self.date.is_none() {
            let today = Utc::now().date_naive();
            debug!("No RMC date yet, assuming {}", today);
            self.date = Some(today);
        }

        let mut date = self.date;
        if let (Some(d), Some(time), Some((last_date, last_time))) = (date, epoch.time, self.last_emitted)
            && d == last_date
            && time < last_time
        {
            // midnight passed before an RMC carried the new date
            date = d.succ_opt();
            self.date = date;
        }

        let vertical_speed_mps = match (epoch.time, epoch.altitude, self.last_altitude) {
            (Some(time), Some(altitude), Some((last_time, last_altitude))) => {
                let mut dt_ms = (time - last_time).num_milliseconds();
                if dt_ms < 0 {
                    dt_ms += MILLIS_PER_DAY;
                }
                if dt_ms > 0 {
                    Some((altitude - last_altitude) / (dt_ms as f64 / 1000.0))
                } else {
                    None
                }
            }
            _ => None,
        };
        if let (Some(time), Some(altitude)) = (epoch.time, epoch.altitude) {
            self.last_altitude = Some((time, altitude));
        }
        if let (Some(d), Some(time)) = (date, epoch.time) {
            self.last_emitted = Some((d, time));
        }

        let fix = Fix {
            time: epoch.time,
            timestamp: match (date, epoch.time) {
                (Some(d), Some(time)) => Some(d.and_time(time).and_utc()),
                _ => None,
            },
            has_fix: epoch.has_fix(),
            latitude: epoch.latitude,
            longitude: epoch.longitude,
            altitude: epoch.altitude,
            course_deg: epoch.course_deg,
            speed_mps: epoch.speed_mps,
            vertical_speed_mps,
            hdop: epoch.hdop,
            num_satellites: epoch.num_satellites,
        };
        trace!("Assembled fix: {:?}", fix);
        self.ready.push_back(fix);
    }
}

impl Default for FixAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageHandler for FixAssembler {
    fn handle_message(&mut self, frame: &NmeaFrame) {
        match &frame.sentence {
            ParseResult::RMC(Some(rmc)) => {
                let time = &rmc.datetime.time;
                let epoch = self.epoch_for(utc_time(
                    time.hours as u32,
                    time.minutes as u32,
                    time.seconds as f64,
                ));
                epoch.rmc_valid = Some(true);
                epoch.latitude = epoch.latitude.or(Some(rmc.latitude.as_f64()));
                epoch.longitude = epoch.longitude.or(Some(rmc.longitude.as_f64()));
                epoch.speed_mps = epoch.speed_mps.or(Some(rmc.speed.as_knots() as f64 * KNOTS_TO_MPS));
                epoch.course_deg = epoch.course_deg.or(rmc.course.as_ref().map(|c| c.degrees as f64));
                // the previous epoch is complete by now and keeps its own date
                let date = &rmc.datetime.date;
                if let Some(date) = utc_date(date.year as i32, date.month as u32, date.day as u32) {
                    self.date = Some(date);
                }
            }
            ParseResult::RMC(None) => {
                self.no_fix_epoch().rmc_valid = Some(false);
            }
            ParseResult::GGA(Some(gga)) => {
                let epoch = self.epoch_for(utc_time(
                    gga.time.hours as u32,
                    gga.time.minutes as u32,
                    gga.time.seconds as f64,
                ));
                epoch.gga_fix = Some(true);
                epoch.latitude = epoch.latitude.or(Some(gga.latitude.as_f64()));
                epoch.longitude = epoch.longitude.or(Some(gga.longitude.as_f64()));
                epoch.altitude = Some(gga.altitude.meters as f64);
                epoch.hdop = Some(gga.hdop as f64);
                epoch.num_satellites = Some(gga.sat_in_use);
            }
            ParseResult::GGA(None) => {
                self.no_fix_epoch().gga_fix = Some(false);
            }
            ParseResult::VTG(Some(vtg)) => {
                let epoch = self.epoch_for(None);
                epoch.speed_mps = epoch.speed_mps.or(Some(vtg.speed.as_knots() as f64 * KNOTS_TO_MPS));
                epoch.course_deg = epoch.course_deg.or(vtg.course.as_ref().map(|c| c.degrees as f64));
            }
            _ => {} // Ignore sentences we're not interested in
        }
    }
}
