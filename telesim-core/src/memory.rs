//! In-memory collaborators.
//!
//! Used by the runtime when no external store is wired in, and by tests that
//! need to observe what the simulation wrote.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use crate::domain::{Reading, ReadingId, Sensor, SensorConfig, SensorId, SensorSnapshot};
use crate::error::{SimulationError, StoreError};
use crate::ports::{ReadingSink, SensorLookup};

#[derive(Debug, Default)]
pub struct InMemorySensorStore {
    sensors: RwLock<HashMap<SensorId, Sensor>>,
}

impl InMemorySensorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a sensor definition.
    pub fn insert(&self, sensor: Sensor) {
        self.sensors.write().insert(sensor.id.clone(), sensor);
    }

    pub fn get(&self, sensor_id: &SensorId) -> Option<Sensor> {
        self.sensors.read().get(sensor_id).cloned()
    }

    pub fn update_config(
        &self,
        sensor_id: &SensorId,
        config: SensorConfig,
    ) -> Result<(), SimulationError> {
        let mut sensors = self.sensors.write();
        let sensor = sensors
            .get_mut(sensor_id)
            .ok_or(SimulationError::SensorNotFound)?;
        sensor.update_config(config)
    }

    /// All sensors ordered by id.
    pub fn all(&self) -> Vec<Sensor> {
        let mut sensors: Vec<Sensor> = self.sensors.read().values().cloned().collect();
        sensors.sort_by(|a, b| a.id.cmp(&b.id));
        sensors
    }

    pub fn len(&self) -> usize {
        self.sensors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.read().is_empty()
    }
}

#[async_trait]
impl SensorLookup for InMemorySensorStore {
    async fn find_by_id(&self, sensor_id: &SensorId) -> Result<Option<SensorSnapshot>, StoreError> {
        Ok(self.get(sensor_id).map(|sensor| sensor.snapshot()))
    }
}

/// Readings kept by [`InMemoryReadingStore::new`].
pub const DEFAULT_RETENTION: usize = 10_000;

/// Reading log with sequential ids starting at 1.
///
/// Holds at most `retention` readings; the oldest are evicted first.
#[derive(Debug)]
pub struct InMemoryReadingStore {
    readings: Mutex<VecDeque<(ReadingId, Reading)>>,
    retention: usize,
    next_id: AtomicI64,
    failing: AtomicBool,
}

impl Default for InMemoryReadingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryReadingStore {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }

    /// A zero retention is treated as one.
    pub fn with_retention(retention: usize) -> Self {
        let retention = retention.max(1);
        Self {
            readings: Mutex::new(VecDeque::with_capacity(retention.min(DEFAULT_RETENTION))),
            retention,
            next_id: AtomicI64::new(1),
            failing: AtomicBool::new(false),
        }
    }

    /// While set, every `save` fails with [`StoreError::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }

    /// Latest retained readings for a sensor, newest first.
    pub fn find_by_sensor_id(&self, sensor_id: &SensorId, limit: usize) -> Vec<Reading> {
        self.readings
            .lock()
            .iter()
            .rev()
            .filter(|(_, reading)| &reading.sensor_id == sensor_id)
            .take(limit)
            .map(|(_, reading)| reading.clone())
            .collect()
    }

    /// `None` once the reading has been evicted.
    pub fn get(&self, id: ReadingId) -> Option<Reading> {
        let readings = self.readings.lock();
        let (oldest, _) = readings.front()?;
        let index = usize::try_from(id.0.checked_sub(oldest.0)?).ok()?;
        readings.get(index).map(|(_, reading)| reading.clone())
    }

    /// Readings saved since creation, evicted ones included.
    pub fn saved_total(&self) -> usize {
        (self.next_id.load(Ordering::Acquire) - 1) as usize
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    /// Readings currently retained.
    pub fn len(&self) -> usize {
        self.readings.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.lock().is_empty()
    }
}

#[async_trait]
impl ReadingSink for InMemoryReadingStore {
    async fn save(&self, reading: Reading) -> Result<ReadingId, StoreError> {
        if self.failing.load(Ordering::Acquire) {
            return Err(StoreError::Unavailable("reading store offline".into()));
        }
        let mut readings = self.readings.lock();
        if readings.len() >= self.retention {
            readings.pop_front();
        }
        // Assigned under the lock so the log stays ordered by id.
        let id = ReadingId(self.next_id.fetch_add(1, Ordering::AcqRel));
        readings.push_back((id, reading));
        Ok(id)
    }
}
