#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use orrery_core::{AstroRuntime, MemoryPersistence, RuntimeSettings};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use urania::ephemeris::FixedEphemeris;
use urania::{
    BirthChart, BirthData, Body, EphemerisProvider, EphemerisSnapshot, TransitModel, TransitState,
    TransitTracker,
};

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

pub fn birth(date: &str) -> BirthData {
    BirthData::new(date, "08:30", 51.5, -0.13)
}

pub fn sky() -> Arc<FixedEphemeris> {
    Arc::new(FixedEphemeris::from_longitudes(&[
        (Body::Sun, 10.0),
        (Body::Moon, 130.0),
        (Body::Mercury, 20.0),
        (Body::Venus, 250.0),
        (Body::Mars, 100.0),
        (Body::Jupiter, 40.0),
        (Body::Saturn, 340.0),
    ]))
}

pub fn settings() -> RuntimeSettings {
    RuntimeSettings {
        job_timeout: Duration::from_secs(5),
        provider_timeout: Duration::from_secs(5),
        ..RuntimeSettings::default()
    }
}

pub fn runtime_with<P: EphemerisProvider + 'static>(
    provider: Arc<P>,
    persistence: Arc<MemoryPersistence>,
) -> AstroRuntime<P> {
    AstroRuntime::new(provider, persistence, settings()).unwrap()
}

pub fn runtime(provider: Arc<FixedEphemeris>) -> AstroRuntime<FixedEphemeris> {
    runtime_with(provider, Arc::new(MemoryPersistence::new()))
}

#[derive(Debug, Clone, Copy)]
pub enum Fault {
    Panic,
    Stall(Duration),
}

/// Transit model that misbehaves for chosen users.
#[derive(Default)]
pub struct FaultyTransits {
    inner: TransitTracker,
    faults: Mutex<HashMap<String, Fault>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl FaultyTransits {
    pub fn set(&self, user: &str, fault: Fault) {
        self.faults.lock().unwrap().insert(user.to_string(), fault);
    }

    pub fn clear(&self) {
        self.faults.lock().unwrap().clear();
    }

    pub fn calls(&self, user: &str) -> usize {
        self.calls.lock().unwrap().get(user).copied().unwrap_or(0)
    }
}

impl TransitModel for FaultyTransits {
    fn compute(&self, chart: &BirthChart, snapshot: &EphemerisSnapshot) -> TransitState {
        *self.calls.lock().unwrap().entry(chart.owner_id.clone()).or_default() += 1;
        let fault = self.faults.lock().unwrap().get(&chart.owner_id).copied();
        match fault {
            Some(Fault::Panic) => panic!("transit model rejected {}", chart.owner_id),
            Some(Fault::Stall(delay)) => std::thread::sleep(delay),
            None => {}
        }
        self.inner.compute(chart, snapshot)
    }
}

pub fn faulty_runtime(
    job_timeout: Duration,
) -> (AstroRuntime<FixedEphemeris>, Arc<FaultyTransits>) {
    let model = Arc::new(FaultyTransits::default());
    let settings = RuntimeSettings {
        job_timeout,
        ..settings()
    };
    let runtime = AstroRuntime::new(sky(), Arc::new(MemoryPersistence::new()), settings)
        .unwrap()
        .with_transit_model(model.clone());
    (runtime, model)
}
