//! # 项目
//!
//! 项目持有测角仪、按名称索引的物相列表以及样品列表。
//! 从物相列表中移除物相时，该物相同时从所有样品中移除；
//! 修改测角仪会使所有样品变为待计算状态。
//!
//! ## JSON 格式
//! ```text
//! {
//!   "name": "...",
//!   "goniometer": {...},
//!   "phases": [{"type": ..., "properties": ...}, ...],
//!   "specimens": [{..., "phase_indeces": {"0": 0.5}}, ...]
//! }
//! ```
//!
//! ## 依赖关系
//! - 被 `commands/calculate.rs` 使用
//! - 使用 `models/`, `xrd/specimen.rs`, `xrd/phase.rs`, `xrd/goniometer.rs`

use crate::error::{PyxrdError, Result};
use crate::models::index_store::IndexListStore;
use crate::models::object_store::{ListEvent, ObjectListStore};
use crate::models::observable::{Handle, Observable};
use crate::xrd::goniometer::Goniometer;
use crate::xrd::phase::{phase_from_json, phase_schema, PhaseModel};
use crate::xrd::specimen::{specimen_schema, Specimen};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::rc::Rc;

#[derive(Serialize, Deserialize)]
struct ProjectJson {
    #[serde(default)]
    name: String,
    #[serde(default)]
    goniometer: Goniometer,
    #[serde(default)]
    phases: Vec<serde_json::Value>,
    #[serde(default)]
    specimens: Vec<serde_json::Value>,
}

/// 计算结果汇总
#[derive(Debug, Clone, PartialEq)]
pub struct CalculationSummary {
    pub specimen: String,
    pub points: usize,
    pub chi2: f64,
    pub rp: f64,
    pub r2: f64,
}

/// 项目
pub struct Project {
    name: String,
    goniometer: Goniometer,
    phases: IndexListStore<dyn PhaseModel>,
    specimens: Rc<ObjectListStore<Specimen>>,
}

impl Project {
    pub fn new(name: impl Into<String>, goniometer: Goniometer) -> Result<Self> {
        let phases = IndexListStore::new(phase_schema()?)?;
        let specimens = Rc::new(ObjectListStore::<Specimen>::new(specimen_schema()));

        let weak = Rc::downgrade(&specimens);
        phases.connect(move |event| {
            if let ListEvent::Removed { item, .. } = event {
                if let Some(specimens) = weak.upgrade() {
                    for specimen in specimens.items() {
                        specimen.modify(|s| s.del_phase(item));
                    }
                }
            }
        });

        Ok(Self {
            name: name.into(),
            goniometer,
            phases,
            specimens,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn goniometer(&self) -> &Goniometer {
        &self.goniometer
    }

    /// 替换测角仪，所有样品变为待计算
    pub fn set_goniometer(&mut self, goniometer: Goniometer) {
        if self.goniometer != goniometer {
            self.goniometer = goniometer;
            for specimen in self.specimens.items() {
                specimen.borrow().invalidate();
            }
        }
    }

    pub fn phases(&self) -> &IndexListStore<dyn PhaseModel> {
        &self.phases
    }

    pub fn specimens(&self) -> &ObjectListStore<Specimen> {
        &self.specimens
    }

    pub fn add_phase(&self, phase: Handle<dyn PhaseModel>) -> Result<usize> {
        self.phases.append(phase)
    }

    /// 移除物相（同时从所有样品中移除）
    pub fn remove_phase(&self, phase: &Handle<dyn PhaseModel>) -> Result<()> {
        self.phases.remove(phase)?;
        Ok(())
    }

    pub fn add_specimen(&self, specimen: Specimen) -> Result<Handle<Specimen>> {
        let handle = Observable::new(specimen);
        self.specimens.append(Rc::clone(&handle))?;
        Ok(handle)
    }

    /// 计算所有样品
    pub fn calculate_all(&self, steps: usize) -> Result<Vec<CalculationSummary>> {
        let mut summaries = Vec::new();
        for specimen in self.specimens.items() {
            let specimen = specimen.borrow();
            specimen.calculate_pattern(&self.goniometer, steps)?;
            let stats = specimen.statistics().values();
            summaries.push(CalculationSummary {
                specimen: specimen.name().to_string(),
                points: stats.points,
                chi2: stats.chi2,
                rp: stats.rp,
                r2: stats.r2,
            });
        }
        Ok(summaries)
    }

    // ─────────────────────────────────────────────────────────────
    // JSON
    // ─────────────────────────────────────────────────────────────

    pub fn to_json(&self) -> Result<serde_json::Value> {
        let phases = self
            .phases
            .items()
            .iter()
            .map(|phase| phase.borrow().to_json())
            .collect::<Result<Vec<_>>>()?;
        let specimens = self
            .specimens
            .items()
            .iter()
            .map(|specimen| specimen.borrow().to_json(|phase| self.phases.position(phase)))
            .collect::<Result<Vec<_>>>()?;

        Ok(serde_json::to_value(ProjectJson {
            name: self.name.clone(),
            goniometer: self.goniometer.clone(),
            phases,
            specimens,
        })?)
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let json: ProjectJson = serde_json::from_value(value.clone())?;
        let project = Project::new(json.name, json.goniometer)?;
        for phase in &json.phases {
            project.add_phase(phase_from_json(phase)?)?;
        }
        for specimen in &json.specimens {
            let specimen = Specimen::from_json(specimen, |i| project.phases.get(i))?;
            project.add_specimen(specimen)?;
        }
        Ok(project)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.to_json()?)?;
        fs::write(path, content).map_err(|e| PyxrdError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PyxrdError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = fs::read_to_string(path).map_err(|e| PyxrdError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        let value: serde_json::Value = serde_json::from_str(&content)?;
        let project = Self::from_json(&value)?;
        log::debug!(
            "Loaded project '{}' with {} phase(s) and {} specimen(s)",
            project.name,
            project.phases.len(),
            project.specimens.len()
        );
        Ok(project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xrd::phase::{Reflection, ReflectionPhase};
    use crate::xrd::specimen::CalculationState;
    use tempfile::tempdir;

    fn phase(name: &str) -> Handle<dyn PhaseModel> {
        ReflectionPhase::new(
            name,
            vec![Reflection {
                d: 1.0,
                intensity: 100.0,
                fwhm: 0.3,
            }],
        )
        .into_handle()
    }

    fn project() -> (Project, Handle<dyn PhaseModel>, Handle<Specimen>) {
        let project = Project::new("test", Goniometer::default()).unwrap();
        let illite = phase("Illite");
        project.add_phase(Rc::clone(&illite)).unwrap();
        project.add_phase(phase("Kaolinite")).unwrap();

        let mut specimen = Specimen::new("s1", "sample");
        specimen.add_phase(Rc::clone(&illite), 0.6);
        let handle = project.add_specimen(specimen).unwrap();
        (project, illite, handle)
    }

    #[test]
    fn test_remove_phase_cascades() {
        let (project, illite, specimen) = project();
        assert_eq!(specimen.borrow().phases().len(), 1);

        project.remove_phase(&illite).unwrap();
        assert!(specimen.borrow().phases().is_empty());
        assert!(project.phases().get_item_by_index("Illite").is_none());
    }

    #[test]
    fn test_duplicate_phase_name_rejected() {
        let (project, _, _) = project();
        assert!(project.add_phase(phase("Illite")).is_err());
    }

    #[test]
    fn test_goniometer_change_makes_stale() {
        let (mut project, _, specimen) = project();
        project.calculate_all(100).unwrap();
        assert_eq!(specimen.borrow().state(), CalculationState::Fresh);

        project.set_goniometer(Goniometer {
            max_2theta: 60.0,
            ..Goniometer::default()
        });
        assert_eq!(specimen.borrow().state(), CalculationState::Stale);
    }

    #[test]
    fn test_calculate_all() {
        let (project, _, specimen) = project();
        let summaries = project.calculate_all(200).unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].specimen, "s1");
        assert_eq!(specimen.borrow().calculated().len(), 200);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("project.json");
        let (project, _, _) = project();
        project.save(&path).unwrap();

        let loaded = Project::load(&path).unwrap();
        assert_eq!(loaded.name(), "test");
        assert_eq!(loaded.phases().len(), 2);
        let specimen = loaded.specimens().get(0).unwrap();
        let phases = specimen.borrow().phases();
        assert_eq!(phases.len(), 1);
        assert_eq!(phases[0].0.borrow().name(), "Illite");
        assert_eq!(phases[0].1, 0.6);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            Project::load(Path::new("/nonexistent/project.json")),
            Err(PyxrdError::FileNotFound { .. })
        ));
    }
}
