//! Tag-dispatched record containers.
//!
//! Scripted actions and conditions, particle sequence events and map blocks are
//! all stored the same way: an i32 record count, then for every record an i32
//! tag followed by the fields of the kind that tag selects. Records carry no
//! length, so an unknown tag ends the decode.

use std::{
    collections::HashMap,
    fmt,
    io::{Read, Write},
};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::{
    error::{self, Error, Result},
    text::TextEncoding,
    write_ext::MyWriteBytesExt,
};

pub mod action;
pub mod condition;
pub mod map_block;
pub mod particle_event;

/// Field layout of a single record kind.
pub trait RecordBody {
    fn read_body(&mut self, reader: &mut dyn Read, text: TextEncoding) -> Result<()>;
    fn write_body(&self, writer: &mut dyn Write, text: TextEncoding) -> Result<()>;
}

/// A record family: one enum variant per registered kind.
pub trait TaggedRecord: Sized {
    fn tag(&self) -> i32;
    fn body(&self) -> &dyn RecordBody;
    fn body_mut(&mut self) -> &mut dyn RecordBody;
}

pub struct RecordKind<R> {
    pub tag: i32,
    pub name: &'static str,
    /// Builds an instance with default fields, ready for [`RecordBody::read_body`].
    pub blank: fn() -> R,
}

impl<R> fmt::Debug for RecordKind<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordKind")
            .field("tag", &self.tag)
            .field("name", &self.name)
            .finish()
    }
}

#[derive(Debug)]
pub struct Registry<R> {
    family: &'static str,
    kinds: HashMap<i32, RecordKind<R>>,
}

impl<R> Registry<R> {
    pub fn new(family: &'static str) -> Self {
        Registry {
            family,
            kinds: HashMap::new(),
        }
    }

    pub fn family(&self) -> &'static str {
        self.family
    }

    /// Panics if `tag` is already registered.
    pub fn register(&mut self, tag: i32, name: &'static str, blank: fn() -> R) -> &mut Self {
        let previous = self.kinds.insert(tag, RecordKind { tag, name, blank });
        assert!(
            previous.is_none(),
            "{} tag {tag} registered twice",
            self.family
        );
        self
    }

    pub fn resolve(&self, tag: i32) -> Result<&RecordKind<R>> {
        self.kinds.get(&tag).ok_or(Error::UnknownTag {
            family: self.family,
            tag,
        })
    }

    /// Registered kinds ordered by tag.
    pub fn kinds(&self) -> Vec<&RecordKind<R>> {
        let mut kinds = self.kinds.values().collect::<Vec<_>>();
        kinds.sort_unstable_by_key(|kind| kind.tag);
        kinds
    }
}

pub fn decode_container<R: TaggedRecord>(
    reader: &mut impl Read,
    registry: &Registry<R>,
    text: TextEncoding,
) -> Result<Vec<R>> {
    let num_records = error::count(registry.family, reader.read_i32::<LittleEndian>()?)?;
    let mut records = Vec::with_capacity(num_records.min(1024));
    for _ in 0..num_records {
        let tag = reader.read_i32::<LittleEndian>()?;
        let kind = registry.resolve(tag)?;
        let mut record = (kind.blank)();
        record.body_mut().read_body(reader, text)?;
        records.push(record);
    }

    log::debug!("decoded {} {} records", records.len(), registry.family);

    Ok(records)
}

pub fn encode_container<R: TaggedRecord>(
    writer: &mut impl Write,
    registry: &Registry<R>,
    records: &[R],
    text: TextEncoding,
) -> Result<()> {
    writer.write_count(registry.family, records.len())?;
    for record in records {
        let tag = record.tag();
        registry.resolve(tag)?;
        writer.write_i32::<LittleEndian>(tag)?;
        record.body().write_body(writer, text)?;
    }
    Ok(())
}
