/// Queue: hands finished command buffers to the backend

use std::cell::Cell;
use std::rc::Rc;

use crate::error::Result;
use crate::gfx::device::DeviceShared;
use crate::gfx::{
    Backend, CommandBuffer, CommandBufferType, Device, Fence, GfxObject, Object, ObjectStatus, ObjectType,
    RecordingState,
};
use crate::gfx_error;

const SOURCE: &str = "cobalt::Queue";

/// Queue capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QueueType {
    #[default]
    Graphics,
    Compute,
    Transfer,
}

/// Descriptor for creating a queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueInfo {
    pub queue_type: QueueType,
}

/// Queue resource
pub struct Queue<B: Backend> {
    object: GfxObject,
    device: Rc<DeviceShared<B>>,
    queue_type: Cell<QueueType>,
}

impl<B: Backend> Queue<B> {
    pub fn new(device: &Device<B>) -> Self {
        Self::from_shared(device.shared.clone())
    }

    pub(crate) fn from_shared(device: Rc<DeviceShared<B>>) -> Self {
        Self {
            object: GfxObject::new(ObjectType::Queue),
            device,
            queue_type: Cell::new(QueueType::Graphics),
        }
    }

    pub fn initialize(&self, info: &QueueInfo) -> bool {
        if !self.object.claim_initialize(SOURCE) {
            return false;
        }
        self.queue_type.set(info.queue_type);
        self.object.set_status(ObjectStatus::Success);
        true
    }

    pub fn destroy(&self) {
        self.object.set_status(ObjectStatus::Unready);
    }

    /// Replay `command_buffers` in order, then arm `fence`
    ///
    /// Buffers that are not finished primary recordings are logged and
    /// skipped. Their draw statistics count towards the current frame.
    pub fn submit(&self, command_buffers: &[Rc<CommandBuffer<B>>], fence: Option<&Fence<B>>) -> Result<()> {
        self.object.ensure_ready(SOURCE, "submit")?;

        for (index, command_buffer) in command_buffers.iter().enumerate() {
            if command_buffer.buffer_type() != CommandBufferType::Primary {
                gfx_error!(SOURCE, "Command buffer {} is secondary, use execute() instead", index);
                continue;
            }
            if command_buffer.state() != RecordingState::Recorded {
                gfx_error!(SOURCE, "Command buffer {} was not ended ({:?})", index, command_buffer.state());
                continue;
            }

            {
                let package = command_buffer.package();
                let allocator = self.device.allocator.borrow();
                self.device.backend.borrow_mut().execute(&package, &allocator)?;
            }
            self.device.add_frame_stats(&command_buffer.stats());
        }

        if let Some(fence) = fence {
            fence.signal()?;
        }
        Ok(())
    }

    pub fn queue_type(&self) -> QueueType {
        self.queue_type.get()
    }

    /// True when submitted work runs after `submit` returns
    pub fn is_async(&self) -> bool {
        self.device.backend.borrow().is_async()
    }
}

impl<B: Backend> Object for Queue<B> {
    fn object(&self) -> &GfxObject {
        &self.object
    }
}
