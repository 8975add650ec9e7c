//! Integration tests for HAL logging
//!
//! These tests verify that rejected operations and backend failures reach a
//! custom logger with their source and location. No GL context required.
//!
//! Run with: cargo test --test logging_integration_tests

mod headless_test_utils;

use std::sync::{Arc, Mutex};

use cobalt_gfx::cobalt::gfx::{
    Device, DeviceInfo, DrawInfo, ShaderInfo, ShaderStage, ShaderStageInfo,
};
use cobalt_gfx::cobalt::log::{reset_logger, set_logger, LogEntry, LogSeverity, Logger};
use cobalt_gfx::cobalt::Error;
use cobalt_gfx_gles::{gl, GlesBackend, HeadlessDriver};
use headless_test_utils::{create_scene, create_test_device, create_test_device_with, full_area, submit_frame};
use serial_test::serial;

// ============================================================================
// TEST LOGGER IMPLEMENTATION
// ============================================================================

/// Test logger that captures log entries for verification
struct TestLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl TestLogger {
    fn new() -> (Self, Arc<Mutex<Vec<LogEntry>>>) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        (Self { entries: entries.clone() }, entries)
    }
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

fn errors(entries: &Arc<Mutex<Vec<LogEntry>>>) -> Vec<LogEntry> {
    entries
        .lock()
        .unwrap()
        .iter()
        .filter(|entry| entry.severity == LogSeverity::Error)
        .cloned()
        .collect()
}

// ============================================================================
// COMMAND RECORDING TESTS
// ============================================================================

#[test]
#[serial]
fn test_integration_draw_outside_pass_logged() {
    let device = create_test_device();
    let scene = create_scene(&device);

    let (test_logger, entries) = TestLogger::new();
    set_logger(test_logger);

    let cb = device.command_buffer().clone();
    cb.begin().unwrap();
    cb.bind_pipeline_state(&scene.pipeline_state).unwrap();
    cb.bind_input_assembler(&scene.input_assembler).unwrap();
    let result = cb.draw_with_info(&DrawInfo::vertices(3));
    cb.end().unwrap();

    reset_logger();

    assert!(matches!(result, Err(Error::InvalidOperation(_))));
    let logged = errors(&entries);
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].source, "cobalt::CommandBuffer");
    assert!(logged[0].message.contains("draw_with_info"));
    assert!(logged[0].file.is_some());
    assert!(logged[0].line.is_some());
}

#[test]
#[serial]
fn test_integration_successful_frame_logs_no_errors() {
    let device = create_test_device();
    let scene = create_scene(&device);

    let (test_logger, entries) = TestLogger::new();
    set_logger(test_logger);

    device.acquire().unwrap();
    submit_frame(&device, |cb| {
        cb.begin_render_pass(&scene.render_pass, &scene.framebuffer, full_area(), &[], 1.0, 0)
            .unwrap();
        cb.bind_pipeline_state(&scene.pipeline_state).unwrap();
        cb.bind_input_assembler(&scene.input_assembler).unwrap();
        cb.draw().unwrap();
        cb.end_render_pass().unwrap();
    });
    device.present().unwrap();

    reset_logger();

    assert!(errors(&entries).is_empty());
}

// ============================================================================
// BACKEND FAILURE TESTS
// ============================================================================

#[test]
#[serial]
fn test_integration_shader_compile_failure_logged() {
    let mut driver = HeadlessDriver::new();
    driver.fail_compile = true;
    let device = Device::new(
        GlesBackend::new(driver),
        DeviceInfo { width: 64, height: 64, ..Default::default() },
    )
    .unwrap();

    let (test_logger, entries) = TestLogger::new();
    set_logger(test_logger);

    let result = device.create_shader(&ShaderInfo {
        name: "broken".to_string(),
        stages: vec![
            ShaderStageInfo { stage: ShaderStage::Vertex, source: "void main(".to_string() },
            ShaderStageInfo { stage: ShaderStage::Fragment, source: "void main() {}".to_string() },
        ],
        ..Default::default()
    });

    reset_logger();

    assert!(result.is_err());
    let logged = errors(&entries);
    assert!(!logged.is_empty());
    assert!(logged.iter().any(|entry| entry.source.starts_with("cobalt::gles")));
    assert!(logged.iter().any(|entry| entry.message.contains("broken")));
}

#[test]
#[serial]
fn test_integration_driver_error_logged_with_validation() {
    let device = create_test_device_with(DeviceInfo { validation: true, ..Default::default() });
    let scene = create_scene(&device);

    let (test_logger, entries) = TestLogger::new();
    set_logger(test_logger);

    device.backend_mut().driver_mut().pending_error = gl::INVALID_OPERATION;
    submit_frame(&device, |cb| {
        cb.begin_render_pass(&scene.render_pass, &scene.framebuffer, full_area(), &[], 1.0, 0)
            .unwrap();
        cb.end_render_pass().unwrap();
    });

    reset_logger();

    let logged = errors(&entries);
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].source, "cobalt::gles::Replay");
    assert!(logged[0].message.contains("INVALID_OPERATION"));
}
