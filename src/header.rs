//! @PG bookkeeping for the output header
//!
//! The output BAM carries the input header plus one program record for this
//! tool, chained by PP to whatever program wrote the input last.

use anyhow::Result;
use bstr::BString;
use noodles::sam::Header;
use noodles::sam::header::record::value::Map;
use noodles::sam::header::record::value::map::Program;
use noodles::sam::header::record::value::map::program::tag;

/// Base ID and PN of the program record
pub const PROGRAM_ID: &str = "dupsample";

/// Version written to the VN field
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// ID of the program no other @PG entry names as its PP
///
/// Falls back to the first entry if every program is referenced (a cycle).
pub fn last_program_id(header: &Header) -> Option<BString> {
    let programs = header.programs().as_ref();
    let is_referenced = |id: &BString| {
        programs.values().any(|pg| {
            pg.other_fields()
                .get(&tag::PREVIOUS_PROGRAM_ID)
                .is_some_and(|pp| pp == id)
        })
    };

    programs
        .keys()
        .find(|id| !is_referenced(id))
        .or_else(|| programs.keys().next())
        .cloned()
}

/// `dupsample`, or `dupsample.N` with the smallest N not already taken
fn unique_program_id(header: &Header) -> BString {
    let programs = header.programs().as_ref();
    std::iter::once(PROGRAM_ID.to_string())
        .chain((1..).map(|i| format!("{PROGRAM_ID}.{i}")))
        .find(|id| !programs.contains_key(id.as_bytes()))
        .map(BString::from)
        .unwrap_or_default()
}

/// Append this run's @PG record to `header`
pub fn add_program_record(mut header: Header, command_line: &str) -> Result<Header> {
    let previous = last_program_id(&header);
    let id = unique_program_id(&header);

    let mut builder = Map::<Program>::builder()
        .insert(tag::NAME, PROGRAM_ID)
        .insert(tag::VERSION, VERSION)
        .insert(tag::COMMAND_LINE, command_line);
    if let Some(pp) = previous {
        builder = builder.insert(tag::PREVIOUS_PROGRAM_ID, pp);
    }

    // `Programs::add` links to every leaf and indexes the graph by PP, which
    // panics on a PP naming a missing program. Exactly one record is wanted here.
    header.programs_mut().as_mut().insert(id, builder.build()?);
    Ok(header)
}
