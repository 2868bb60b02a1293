#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use schooldesk_console::checkin::camera::{Camera, CameraDevice, ScanSettings};
use schooldesk_console::pagination::{Refresh, RefreshOutcome};
use schooldesk_core::errors::{DeskError, DeskResult};
use schooldesk_core::models::grade::GradeCatalog;
use schooldesk_core::models::page::{PageQuery, ViewPage};
use schooldesk_core::models::subject::{Subject, Teacher, TeacherUser};
use schooldesk_store::RecordClient;
use schooldesk_store::mock::MockBackend;
use serde_json::{Value, json};

pub fn client(backend: MockBackend) -> RecordClient {
    RecordClient::new(Arc::new(backend))
}

pub fn attendance_json(id: u64) -> Value {
    json!({
        "id": id,
        "user": {"id": 100 + id, "name": format!("Student {}", id), "email": format!("s{}@school.test", id)},
        "className": "8B",
        "date": "2024-05-01T00:00:00.000Z",
        "time": "2024-05-01T07:30:00.000Z",
        "method": "manual",
        "status": "present"
    })
}

/// Server page of a collection of `total` attendance rows with ids 1..=total.
pub fn attendance_page(total: u64, query: PageQuery) -> ViewPage<Value> {
    let all = (1..=total).map(attendance_json).collect();
    ViewPage::slice(all, query)
}

pub fn catalog(subjects: u64) -> GradeCatalog {
    GradeCatalog {
        subjects: (1..=subjects)
            .map(|id| Subject {
                id,
                name: format!("Subject {}", id),
                teachers: Vec::new(),
            })
            .collect(),
        teachers: vec![Teacher {
            id: 2,
            user_id: 20,
            user: Some(TeacherUser {
                id: 20,
                name: "Pak Budi".to_string(),
            }),
        }],
    }
}

/// View that only counts how often it was asked to reload.
#[derive(Debug, Default)]
pub struct CountingView {
    pub refreshes: usize,
}

#[async_trait]
impl Refresh for CountingView {
    async fn refresh(&mut self) -> RefreshOutcome {
        self.refreshes += 1;
        RefreshOutcome::Applied
    }
}

/// Scripted camera. Once the scripted frames run out it waits forever.
#[derive(Debug, Default)]
pub struct FakeCamera {
    pub devices: Vec<CameraDevice>,
    pub enumerate_error: Option<String>,
    pub frames: VecDeque<DeskResult<Option<String>>>,
    pub started: Option<String>,
    pub starts: Vec<String>,
    pub settings: Option<ScanSettings>,
    pub stops: usize,
    pub clears: usize,
}

impl FakeCamera {
    pub fn with_devices(labels: &[(&str, &str)]) -> Self {
        Self {
            devices: labels
                .iter()
                .map(|(id, label)| CameraDevice {
                    id: id.to_string(),
                    label: label.to_string(),
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn frames(mut self, frames: Vec<DeskResult<Option<String>>>) -> Self {
        self.frames = frames.into();
        self
    }
}

#[async_trait]
impl Camera for FakeCamera {
    async fn devices(&mut self) -> DeskResult<Vec<CameraDevice>> {
        match &self.enumerate_error {
            Some(message) => Err(DeskError::Hardware(message.clone())),
            None => Ok(self.devices.clone()),
        }
    }

    async fn start(&mut self, device: &CameraDevice, settings: ScanSettings) -> DeskResult<()> {
        self.started = Some(device.id.clone());
        self.starts.push(device.id.clone());
        self.settings = Some(settings);
        Ok(())
    }

    async fn next_frame(&mut self) -> DeskResult<Option<String>> {
        match self.frames.pop_front() {
            Some(frame) => frame,
            None => std::future::pending().await,
        }
    }

    async fn stop(&mut self) -> DeskResult<()> {
        self.stops += 1;
        if self.started.take().is_none() {
            return Err(DeskError::Hardware("Camera was not started".into()));
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.clears += 1;
    }
}
