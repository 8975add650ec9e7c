/// Input assembler: vertex streams, attribute layout and optional index/indirect buffers

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::Rc;

use crate::gfx::device::DeviceShared;
use crate::gfx::object::NativeSlot;
use crate::gfx::{
    Backend, Buffer, BufferUsage, Device, DrawInfo, Format, GfxObject, Object, ObjectStatus, ObjectType,
};
use crate::gfx_error;

const SOURCE: &str = "cobalt::InputAssembler";

/// Attribute step rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VertexInputRate {
    #[default]
    Vertex,
    Instance,
}

/// One vertex attribute read from a vertex stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// Shader input location
    pub location: u32,
    /// Index into the vertex buffer list
    pub stream: u32,
    pub format: Format,
    /// Byte offset inside one vertex
    pub offset: u32,
    pub normalized: bool,
    pub input_rate: VertexInputRate,
}

impl VertexAttribute {
    pub fn new(location: u32, format: Format, offset: u32) -> Self {
        Self {
            location,
            stream: 0,
            format,
            offset,
            normalized: false,
            input_rate: VertexInputRate::Vertex,
        }
    }
}

/// Index element width, derived from the index buffer stride
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    U8,
    U16,
    U32,
}

impl IndexType {
    pub fn from_stride(stride: u32) -> Option<Self> {
        match stride {
            1 => Some(IndexType::U8),
            2 => Some(IndexType::U16),
            4 => Some(IndexType::U32),
            _ => None,
        }
    }

    pub fn size(self) -> u32 {
        match self {
            IndexType::U8 => 1,
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

/// Descriptor for creating an input assembler
pub struct InputAssemblerInfo<B: Backend> {
    pub attributes: Vec<VertexAttribute>,
    pub vertex_buffers: Vec<Rc<Buffer<B>>>,
    pub index_buffer: Option<Rc<Buffer<B>>>,
    /// Buffer with `INDIRECT` usage replacing the single derived draw
    pub indirect_buffer: Option<Rc<Buffer<B>>>,
}

impl<B: Backend> InputAssemblerInfo<B> {
    pub fn new(attributes: Vec<VertexAttribute>, vertex_buffers: Vec<Rc<Buffer<B>>>) -> Self {
        Self {
            attributes,
            vertex_buffers,
            index_buffer: None,
            indirect_buffer: None,
        }
    }
}

/// Input assembler resource
pub struct InputAssembler<B: Backend> {
    object: GfxObject,
    device: Rc<DeviceShared<B>>,
    attributes: RefCell<Vec<VertexAttribute>>,
    vertex_buffers: RefCell<Vec<Rc<Buffer<B>>>>,
    index_buffer: RefCell<Option<Rc<Buffer<B>>>>,
    indirect_buffer: RefCell<Option<Rc<Buffer<B>>>>,
    draw_info: Cell<DrawInfo>,
    native: NativeSlot<B::InputAssembler>,
}

impl<B: Backend> InputAssembler<B> {
    pub fn new(device: &Device<B>) -> Self {
        Self {
            object: GfxObject::new(ObjectType::InputAssembler),
            device: device.shared.clone(),
            attributes: RefCell::new(Vec::new()),
            vertex_buffers: RefCell::new(Vec::new()),
            index_buffer: RefCell::new(None),
            indirect_buffer: RefCell::new(None),
            draw_info: Cell::new(DrawInfo::default()),
            native: NativeSlot::new(),
        }
    }

    pub fn initialize(&self, info: &InputAssemblerInfo<B>) -> bool {
        if !self.object.claim_initialize(SOURCE) {
            return false;
        }
        if !validate(info) {
            return false;
        }

        let mut draw_info = DrawInfo::vertices(info.vertex_buffers[0].count());
        if let Some(index_buffer) = &info.index_buffer {
            draw_info.index_count = index_buffer.count();
        }

        let created = self.device.backend.borrow_mut().create_input_assembler(info);
        match created {
            Ok(native) => {
                self.native.set(native);
                *self.attributes.borrow_mut() = info.attributes.clone();
                *self.vertex_buffers.borrow_mut() = info.vertex_buffers.clone();
                *self.index_buffer.borrow_mut() = info.index_buffer.clone();
                *self.indirect_buffer.borrow_mut() = info.indirect_buffer.clone();
                self.draw_info.set(draw_info);
                self.object.set_status(ObjectStatus::Success);
                true
            }
            Err(err) => {
                gfx_error!(SOURCE, "Backend failed to create input assembler: {}", err);
                self.object.set_status(ObjectStatus::Failed);
                false
            }
        }
    }

    pub fn destroy(&self) {
        if let Some(native) = self.native.take() {
            self.device.release(SOURCE, |backend| backend.destroy_input_assembler(native));
        }
        self.vertex_buffers.borrow_mut().clear();
        self.index_buffer.borrow_mut().take();
        self.indirect_buffer.borrow_mut().take();
        self.object.set_status(ObjectStatus::Unready);
    }

    /// Draw parameters used when no indirect buffer is attached
    pub fn draw_info(&self) -> DrawInfo {
        self.draw_info.get()
    }

    pub fn set_draw_info(&self, draw_info: DrawInfo) {
        self.draw_info.set(draw_info);
    }

    pub fn set_vertex_count(&self, count: u32) {
        self.edit_draw_info(|info| info.vertex_count = count);
    }

    pub fn set_first_vertex(&self, first: u32) {
        self.edit_draw_info(|info| info.first_vertex = first);
    }

    pub fn set_index_count(&self, count: u32) {
        self.edit_draw_info(|info| info.index_count = count);
    }

    pub fn set_first_index(&self, first: u32) {
        self.edit_draw_info(|info| info.first_index = first);
    }

    pub fn set_vertex_offset(&self, offset: i32) {
        self.edit_draw_info(|info| info.vertex_offset = offset);
    }

    pub fn set_instance_count(&self, count: u32) {
        self.edit_draw_info(|info| info.instance_count = count);
    }

    pub fn set_first_instance(&self, first: u32) {
        self.edit_draw_info(|info| info.first_instance = first);
    }

    fn edit_draw_info(&self, edit: impl FnOnce(&mut DrawInfo)) {
        let mut info = self.draw_info.get();
        edit(&mut info);
        self.draw_info.set(info);
    }

    pub fn attributes(&self) -> Ref<'_, [VertexAttribute]> {
        Ref::map(self.attributes.borrow(), Vec::as_slice)
    }

    pub fn vertex_buffers(&self) -> Ref<'_, [Rc<Buffer<B>>]> {
        Ref::map(self.vertex_buffers.borrow(), Vec::as_slice)
    }

    pub fn index_buffer(&self) -> Option<Rc<Buffer<B>>> {
        self.index_buffer.borrow().clone()
    }

    pub fn indirect_buffer(&self) -> Option<Rc<Buffer<B>>> {
        self.indirect_buffer.borrow().clone()
    }

    /// Index width, `None` for non-indexed assemblers
    pub fn index_type(&self) -> Option<IndexType> {
        self.index_buffer
            .borrow()
            .as_ref()
            .and_then(|buffer| IndexType::from_stride(buffer.stride()))
    }

    pub fn native(&self) -> Option<Ref<'_, B::InputAssembler>> {
        self.native.get()
    }

    pub fn native_mut(&self) -> Option<RefMut<'_, B::InputAssembler>> {
        self.native.get_mut()
    }
}

impl<B: Backend> Object for InputAssembler<B> {
    fn object(&self) -> &GfxObject {
        &self.object
    }
}

impl<B: Backend> Drop for InputAssembler<B> {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn validate<B: Backend>(info: &InputAssemblerInfo<B>) -> bool {
    if info.vertex_buffers.is_empty() {
        gfx_error!(SOURCE, "Input assembler needs at least one vertex buffer");
        return false;
    }
    for (stream, buffer) in info.vertex_buffers.iter().enumerate() {
        if !buffer.is_ready() || !buffer.usage().contains(BufferUsage::VERTEX) {
            gfx_error!(SOURCE, "Vertex buffer {} is not a ready VERTEX buffer", stream);
            return false;
        }
    }
    if let Some(attribute) = info
        .attributes
        .iter()
        .find(|attribute| attribute.stream as usize >= info.vertex_buffers.len())
    {
        gfx_error!(
            SOURCE,
            "Attribute at location {} reads stream {} of {}",
            attribute.location,
            attribute.stream,
            info.vertex_buffers.len()
        );
        return false;
    }
    if let Some(index_buffer) = &info.index_buffer {
        if !index_buffer.is_ready() || !index_buffer.usage().contains(BufferUsage::INDEX) {
            gfx_error!(SOURCE, "Index buffer is not a ready INDEX buffer");
            return false;
        }
        if IndexType::from_stride(index_buffer.stride()).is_none() {
            gfx_error!(SOURCE, "Index stride {} is not 1, 2 or 4 bytes", index_buffer.stride());
            return false;
        }
    }
    if let Some(indirect_buffer) = &info.indirect_buffer {
        if !indirect_buffer.is_ready() || !indirect_buffer.usage().contains(BufferUsage::INDIRECT) {
            gfx_error!(SOURCE, "Indirect buffer is not a ready INDIRECT buffer");
            return false;
        }
    }
    true
}
