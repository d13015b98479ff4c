use crate::imports::*;

/// A station stop along the route.
///
/// Passenger counts, when provided, fix the exchange at this station;
/// otherwise the dwell controller draws them from the session RNG.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteStation {
    /// User-facing station name
    #[serde(rename = "Station")]
    pub name: String,
    /// Cumulative distance from the route origin
    #[serde(rename = "Offset (m)")]
    pub offset: si::Length,
    /// Fixed alighting count, if not randomized
    #[serde(rename = "Alight", default)]
    pub alight: Option<u32>,
    /// Fixed boarding count, if not randomized
    #[serde(rename = "Board", default)]
    pub board: Option<u32>,
}

impl RouteStation {
    pub fn new(name: &str, offset: si::Length) -> Self {
        Self {
            name: name.into(),
            offset,
            alight: None,
            board: None,
        }
    }
}

/// Immutable ordered station list with cumulative offsets.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct Route {
    pub stations: Vec<RouteStation>,
}

impl Init for Route {
    fn init(&mut self) -> Result<(), Error> {
        if self.stations.len() < 2 {
            return Err(Error::InvalidRouteData(format!(
                "expected at least 2 stations, got {}",
                self.stations.len()
            )));
        }
        let offsets: Vec<f64> = self
            .stations
            .iter()
            .map(|s| s.offset.get::<si::meter>())
            .collect();
        if !is_strictly_sorted(&offsets) {
            return Err(Error::InvalidRouteData(
                "station offsets must be strictly increasing".into(),
            ));
        }
        if offsets[0] < 0.0 {
            return Err(Error::InvalidRouteData(
                "station offsets must be non-negative".into(),
            ));
        }
        Ok(())
    }
}
impl SerdeAPI for Route {}

impl Route {
    pub fn new(stations: Vec<RouteStation>) -> anyhow::Result<Self> {
        let mut route = Self { stations };
        route.init()?;
        Ok(route)
    }

    /// Total route length, i.e. the offset of the final station.
    pub fn len_total(&self) -> si::Length {
        self.stations
            .last()
            .map(|s| s.offset)
            .unwrap_or(si::Length::ZERO)
    }

    /// Index of the station at or behind `position` (0 if the train has
    /// not yet reached the first station).
    pub fn current_index(&self, position: si::Length) -> usize {
        self.stations
            .iter()
            .rposition(|s| s.offset <= position)
            .unwrap_or(0)
    }

    /// Index of the next stopping station, saturating at the final one.
    pub fn next_index(&self, position: si::Length) -> usize {
        (self.current_index(position) + 1).min(self.stations.len() - 1)
    }

    /// Distance remaining to the station at `idx`, floored at zero.
    pub fn dist_to(&self, idx: usize, position: si::Length) -> si::Length {
        (self.stations[idx].offset - position).max(si::Length::ZERO)
    }

    /// Fraction of the route covered at `position`.
    pub fn progress(&self, position: si::Length) -> si::Ratio {
        let len = self.len_total();
        if len > si::Length::ZERO {
            position / len
        } else {
            si::Ratio::ZERO
        }
    }

    /// Load a station table from csv with columns
    /// `Station, Offset (m) [, Alight, Board]`.
    pub fn from_csv_file<P: AsRef<Path>>(filepath: P) -> anyhow::Result<Self> {
        let file_read = File::open(filepath.as_ref()).with_context(|| format_dbg!())?;
        let mut reader = csv::Reader::from_reader(file_read);
        let mut stations: Vec<RouteStation> = vec![];
        for result in reader.deserialize() {
            let station: RouteStation = result?;
            stations.push(station);
        }
        Route::new(stations)
    }
}

impl Valid for Route {
    /// Mumbai CSMT → Pune Jn with real-ish cumulative distances.
    fn valid() -> Self {
        Self {
            stations: vec![
                RouteStation::new("Mumbai CSMT", si::Length::ZERO),
                RouteStation::new("Dadar", 10.0 * uc::KM),
                RouteStation::new("Thane", 24.0 * uc::KM),
                RouteStation::new("Kalyan Jn", 44.0 * uc::KM),
                RouteStation::new("Karjat", 84.0 * uc::KM),
                RouteStation::new("Lonavala", 113.0 * uc::KM),
                RouteStation::new("Shivajinagar", 171.0 * uc::KM),
                RouteStation::new("Pune Jn", 177.0 * uc::KM),
            ],
        }
    }
}
