//! Builtin transform components.

use bevy_ecs::prelude::Component;
use buffer::{BufferResult, ByteReader, ByteWriter};

use crate::component::SnapshotComponent;
use crate::error::SnapshotResult;
use crate::manager::SnapshotManager;

/// World-space position; 12-byte payload `x, y, z`.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl SnapshotComponent for Position {
    const NAMESPACE: &'static str = "transform";
    const TYPE_NAME: &'static str = "Position";
    const PAYLOAD_SIZE: usize = 12;

    fn write_payload(&self, writer: &mut ByteWriter) -> BufferResult<()> {
        writer.write([self.x, self.y, self.z])
    }

    fn read_payload(reader: &mut ByteReader<'_>) -> BufferResult<Self> {
        let [x, y, z] = reader.read::<[f32; 3]>()?;
        Ok(Self { x, y, z })
    }
}

/// Orientation quaternion; 16-byte payload `x, y, z, w`.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rotation {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Rotation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Rotation {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }
}

impl SnapshotComponent for Rotation {
    const NAMESPACE: &'static str = "transform";
    const TYPE_NAME: &'static str = "Rotation";
    const PAYLOAD_SIZE: usize = 16;

    fn write_payload(&self, writer: &mut ByteWriter) -> BufferResult<()> {
        writer.write([self.x, self.y, self.z, self.w])
    }

    fn read_payload(reader: &mut ByteReader<'_>) -> BufferResult<Self> {
        let [x, y, z, w] = reader.read::<[f32; 4]>()?;
        Ok(Self { x, y, z, w })
    }
}

/// Linear and angular velocity; 24-byte payload.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Velocity {
    pub linear: [f32; 3],
    pub angular: [f32; 3],
}

impl SnapshotComponent for Velocity {
    const NAMESPACE: &'static str = "transform";
    const TYPE_NAME: &'static str = "Velocity";
    const PAYLOAD_SIZE: usize = 24;

    fn write_payload(&self, writer: &mut ByteWriter) -> BufferResult<()> {
        writer.write(self.linear)?;
        writer.write(self.angular)
    }

    fn read_payload(reader: &mut ByteReader<'_>) -> BufferResult<Self> {
        Ok(Self {
            linear: reader.read()?,
            angular: reader.read()?,
        })
    }
}

/// Registers streamers for [`Position`], [`Rotation`] and [`Velocity`], in that order.
pub fn register_transform_streamers(manager: &mut SnapshotManager) -> SnapshotResult<()> {
    manager.register_component::<Position>()?;
    manager.register_component::<Rotation>()?;
    manager.register_component::<Velocity>()?;
    Ok(())
}
