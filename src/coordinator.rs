//! Coordinator (spec §4.8): owns the options, drives byte source -> transcoder
//! -> block splitter sequentially (this stage cannot be parallelized: carry
//! tails make each read depend on the last), then fans the per-row parse and
//! convert work out across a worker pool when `use_threads` is set.
//!
//! Schema inference runs over the *entire* input rather than just the first
//! chunk (see DESIGN.md): `DataType::promote` is commutative and
//! associative, so folding every chunk's observations into the registry in
//! any order (sequential or parallel) reaches the same final type. That
//! sidesteps mid-stream widening rewrites entirely and is what makes
//! `use_threads` true/false produce byte-identical tables (spec §8,
//! invariant 6).

use std::collections::HashSet;
use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use parking_lot::RwLock;
use rayon::prelude::*;
use snafu::ResultExt;

use crate::builder::ColumnBuilder;
use crate::convert::{Value, ValueConverter};
use crate::error::{ArrowSnafu, Result};
use crate::infer::TypeInferencer;
use crate::options::{ConvertOptions, ParseOptions, ReadOptions};
use crate::row::{FieldSlice, RowParser};
use crate::schema::SchemaRegistry;
use crate::source::ByteSource;
use crate::splitter::{BlockSplitter, Row};
use crate::transcode::Transcoder;

/// One byte-source read's worth of already row-split, already field-split
/// data rows, the parallelism granularity (spec glossary: "Block").
struct ParsedChunk {
    rows: Vec<Vec<FieldSlice>>,
}

pub struct Coordinator {
    parse_options: ParseOptions,
    read_options: ReadOptions,
    convert_options: ConvertOptions,
}

impl Coordinator {
    pub fn new(
        parse_options: ParseOptions,
        read_options: ReadOptions,
        convert_options: ConvertOptions,
    ) -> Self {
        Self {
            parse_options,
            read_options,
            convert_options,
        }
    }

    pub fn run(&self, mut source: impl ByteSource) -> Result<RecordBatch> {
        self.read_options.validate()?;

        let (column_names, chunks) = self.read_and_split(&mut source)?;
        let registry = self.infer_schema(&column_names, &chunks);
        let converted = self.convert_chunks(&column_names, &registry, &chunks)?;
        self.assemble(&column_names, &registry, converted)
    }

    /// Sequential producer stage: reads blocks, transcodes, splits into
    /// rows, and consumes header/skip_rows/empty-line rules from the row
    /// stream. Returns the resolved column names and the surviving data
    /// rows, field-split and grouped by source read.
    fn read_and_split(
        &self,
        source: &mut impl ByteSource,
    ) -> Result<(Vec<String>, Vec<ParsedChunk>)> {
        let encoding_spec = self.read_options.encoding_spec();
        let mut transcoder = Transcoder::try_new(&encoding_spec)?;
        let mut splitter = BlockSplitter::new();
        let row_parser = RowParser::new(
            self.parse_options.field_widths(),
            &self.parse_options.skip_columns,
        );
        let unfiltered_skip = HashSet::new();
        let header_parser = RowParser::new(self.parse_options.field_widths(), &unfiltered_skip);

        let has_explicit_names = self.read_options.has_explicit_column_names();
        let mut column_names: Vec<String> = if has_explicit_names {
            self.read_options
                .column_names
                .iter()
                .enumerate()
                .filter(|(i, _)| !self.parse_options.skip_columns.contains(i))
                .map(|(_, name)| name.clone())
                .collect()
        } else {
            Vec::new()
        };

        let header_rows_total = if has_explicit_names {
            0
        } else {
            self.parse_options.header_rows
        };
        let mut header_rows_remaining = header_rows_total;
        let mut skip_rows_remaining = self.read_options.skip_rows;

        let mut chunks = Vec::new();
        let mut eof = false;
        while !eof {
            let (block, block_eof) = source.read_block(self.read_options.block_size)?;
            eof = block_eof;
            // `Transcoder::transcode_block` already re-processes an
            // undersized output buffer internally by growing it and
            // resuming from the unconsumed tail of the block (spec §4.2);
            // a BufferTooSmall that still escapes that is the pathological
            // case spec §7 allows to surface rather than retry.
            let utf8 = transcoder.transcode_block(
                &block,
                eof,
                self.read_options.buffer_safety_factor,
                self.read_options.block_size,
            )?;
            let rows = splitter.split_block(&utf8, eof);

            let mut data_rows = Vec::with_capacity(rows.len());
            for row in rows {
                if self.parse_options.ignore_empty_lines && row.bytes.is_empty() {
                    continue;
                }
                if header_rows_remaining > 0 {
                    if header_rows_remaining == header_rows_total {
                        column_names = header_names(
                            &row,
                            &header_parser,
                            &self.parse_options.skip_columns,
                        );
                    }
                    header_rows_remaining -= 1;
                    continue;
                }
                if skip_rows_remaining > 0 {
                    skip_rows_remaining -= 1;
                    continue;
                }
                data_rows.push(row_parser.parse(&row.bytes));
            }
            chunks.push(ParsedChunk { rows: data_rows });
        }

        Ok((column_names, chunks))
    }

    fn infer_schema(&self, column_names: &[String], chunks: &[ParsedChunk]) -> SchemaRegistry {
        let mut registry = SchemaRegistry::new(column_names.to_vec());
        let declared: HashSet<&str> = self
            .convert_options
            .column_types
            .keys()
            .map(String::as_str)
            .collect();
        for (name, declared_type) in &self.convert_options.column_types {
            registry.set_declared(name, *declared_type);
        }

        let inferencer = TypeInferencer::new(&self.convert_options);
        let registry_lock = RwLock::new(registry);
        let observe_chunk = |chunk: &ParsedChunk| {
            for row in &chunk.rows {
                for (slice, name) in row.iter().zip(column_names.iter()) {
                    if declared.contains(name.as_str()) {
                        continue;
                    }
                    inferencer.observe(&mut registry_lock.write(), name, slice.trimmed());
                }
            }
        };

        if self.read_options.use_threads {
            chunks.par_iter().for_each(observe_chunk);
        } else {
            chunks.iter().for_each(observe_chunk);
        }

        registry_lock.into_inner()
    }

    /// Converts every field, using each column's final resolved type.
    /// Because inference already folded in every chunk's observations, a
    /// value here is guaranteed to fit its column's type unless that type
    /// was declared (bypassing inference) rather than inferred.
    fn convert_chunks(
        &self,
        column_names: &[String],
        registry: &SchemaRegistry,
        chunks: &[ParsedChunk],
    ) -> Result<Vec<Vec<Vec<Value>>>> {
        let converter = ValueConverter::new(&self.convert_options);
        let mut row_offset = 0usize;
        let mut offsets = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            offsets.push(row_offset);
            row_offset += chunk.rows.len();
        }

        let convert_chunk = |(chunk, &offset): (&ParsedChunk, &usize)| -> Result<Vec<Vec<Value>>> {
            chunk
                .rows
                .iter()
                .enumerate()
                .map(|(local_index, row)| {
                    row.iter()
                        .zip(column_names.iter())
                        .map(|(slice, name)| {
                            let target = registry.data_type(name);
                            converter.convert(offset + local_index, name, slice.as_bytes(), target)
                        })
                        .collect::<Result<Vec<_>>>()
                })
                .collect::<Result<Vec<_>>>()
        };

        if self.read_options.use_threads {
            chunks
                .par_iter()
                .zip(offsets.par_iter())
                .map(convert_chunk)
                .collect()
        } else {
            chunks.iter().zip(offsets.iter()).map(convert_chunk).collect()
        }
    }

    fn assemble(
        &self,
        column_names: &[String],
        registry: &SchemaRegistry,
        converted: Vec<Vec<Vec<Value>>>,
    ) -> Result<RecordBatch> {
        let total_rows: usize = converted.iter().map(Vec::len).sum();
        let mut builders: Vec<ColumnBuilder> = column_names
            .iter()
            .map(|name| ColumnBuilder::new(registry.data_type(name), total_rows))
            .collect();

        for chunk_rows in converted {
            for row in chunk_rows {
                for (column_index, value) in row.into_iter().enumerate() {
                    builders[column_index].append(value);
                }
            }
        }

        let fields: Vec<Field> = column_names
            .iter()
            .map(|name| Field::new(name, registry.data_type(name).to_arrow(), true))
            .collect();
        let schema = Arc::new(Schema::new(fields));
        let columns: Vec<ArrayRef> = builders.into_iter().map(ColumnBuilder::finalize).collect();

        RecordBatch::try_new(schema, columns).context(ArrowSnafu)
    }
}

/// Extracts trimmed field names from an unfiltered header row, then applies
/// `skip_columns` (spec §9: names are resolved from the unfiltered header,
/// filtered afterward).
fn header_names(row: &Row, header_parser: &RowParser, skip_columns: &HashSet<usize>) -> Vec<String> {
    header_parser
        .parse(&row.bytes)
        .iter()
        .enumerate()
        .filter(|(index, _)| !skip_columns.contains(index))
        .map(|(_, slice)| String::from_utf8_lossy(slice.trimmed()).into_owned())
        .collect()
}
