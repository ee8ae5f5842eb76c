//! This module is in charge of outputting the selection results to the
//! standard output and various files

use crate::{
    channel::Channel,
    numeric::{reals, Float},
    scheduling::SelectionOutput,
    truth::DecayMode,
};
use std::{
    fs::{File, OpenOptions},
    io::{self, Result, Write},
    path::Path,
    time::Duration,
};
use time::{macros::format_description, OffsetDateTime};

/// Name of the cut-flow report
pub const CUTFLOW_FILE: &str = "cutflow.dat";

/// Name of the timing report
pub const TIMES_FILE: &str = "selection.times";

/// Name of the file which every run appends a summary line to
pub const HISTORY_FILE: &str = "selection.log";

// Number of significant digits in file output
const SIG_DIGITS: usize = (reals::DIGITS - 1) as usize;

/// Output the selection results to the console and to files in `dir`
pub fn dump_results(
    dir: &Path,
    channel: Channel,
    output: &SelectionOutput,
    elapsed_time: Duration,
) -> Result<()> {
    let tagged = &output.tagged;
    let num_events = tagged.pass.len();
    let num_passed = tagged.num_passed();
    let yields = tagged.category_yields();

    // Print out a summary on stdout
    println!("Channel {channel}: {num_passed} of {num_events} events selected");
    for tally in output.cutflow.tallies() {
        println!(
            "  {:<45} {:>9} / {:<9} ({:.1}%)",
            tally.name,
            tally.num_passed,
            tally.num_tested,
            100. * tally.efficiency()
        );
    }
    for (category, count) in &yields {
        println!("  category {category:>3}: {count} events");
    }

    // Compute a timestamp of when the run ended
    let timestamp = OffsetDateTime::now_utc()
        .format(format_description!(
            "[day]-[month repr:short]-[year repr:last_two]   [hour]:[minute]:[second]"
        ))
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    // Write execution timings to a file
    {
        let mut tim_file = File::create(dir.join(TIMES_FILE))?;
        let tim_file = &mut tim_file;

        writeln_report(tim_file, &timestamp[..])?;
        let elapsed_secs = elapsed_time.as_secs_f64() as Float;
        writeln_report(tim_file, "---------------------------------------------")?;
        writeln_report(tim_file, ("Elapsed time", elapsed_secs))?;
        let secs_per_ev = elapsed_secs / (num_events.max(1) as Float);
        writeln_report(tim_file, ("Elapsed time per event", secs_per_ev))?;
    }

    // Write the cut flow, decay-mode counts and category yields
    {
        let mut dat_file = File::create(dir.join(CUTFLOW_FILE))?;
        let dat_file = &mut dat_file;

        writeln_report(dat_file, ("Channel", channel.to_string().as_str()))?;
        writeln_report(dat_file, ("Number of events", num_events))?;
        writeln_report(dat_file, ("... after selection", num_passed))?;
        writeln_report(dat_file, "---------------------------------------------")?;
        for tally in output.cutflow.tallies() {
            writeln_report(dat_file, (tally.name.as_str(), tally.num_passed))?;
            writeln_report(dat_file, ("... efficiency", tally.efficiency() as Float))?;
        }
        writeln_report(dat_file, "---------------------------------------------")?;
        for mode in DecayMode::ALL {
            let key = format!("Decay mode {}", mode.label());
            writeln_report(dat_file, (key.as_str(), tagged.partition.get(mode)))?;
        }
        writeln_report(dat_file, ("Decay mode unlabeled", tagged.partition.unlabeled))?;
        writeln_report(dat_file, "---------------------------------------------")?;
        for (category, count) in &yields {
            let key = format!("Category {category}");
            writeln_report(dat_file, (key.as_str(), *count))?;
        }
        for report in &tagged.degenerate {
            let key = format!("Events without {}", report.collection);
            writeln_report(dat_file, (key.as_str(), report.num_events))?;
        }
    }

    // Append the results of this run to a cumulative file
    {
        let mut history = OpenOptions::new()
            .append(true)
            .create(true)
            .open(dir.join(HISTORY_FILE))?;
        writeln!(
            history,
            "{timestamp} {channel} {num_events} {num_passed} {}",
            yields
                .iter()
                .map(|(category, count)| format!("{category}:{count}"))
                .collect::<Vec<_>>()
                .join(",")
        )?;
    }

    // ...and we're done
    Ok(())
}

/// Text output facility with aligned key/value columns
fn writeln_report(file: &mut File, data: impl WriteReport) -> Result<()> {
    write!(file, " ")?;
    data.write(file)?;
    writeln!(file)
}

/// Trait implemented by things which can be printed in report files
trait WriteReport: Sized {
    /// Write down `self` to the output file
    fn write(self, file: &mut File) -> Result<()>;
}

impl WriteReport for &str {
    fn write(self, file: &mut File) -> Result<()> {
        write!(file, "{self}")
    }
}

impl WriteReport for usize {
    fn write(self, file: &mut File) -> Result<()> {
        write!(file, "{self}")
    }
}

impl WriteReport for Float {
    // Close approximation of C's %g
    fn write(self, file: &mut File) -> Result<()> {
        write_engineering(file, self, SIG_DIGITS)
    }
}

impl<T: WriteReport> WriteReport for (&str, T) {
    // Key-value output that uses fixed-size columns for better readability
    fn write(self, file: &mut File) -> Result<()> {
        write!(*file, "{:<31}: ", self.0)?;
        self.1.write(file)
    }
}

/// Write a floating-point number using "engineering" notation
///
/// Analogous to the %g format of the C printf function, this switches between
/// naive and scientific notation depending on the order of magnitude.
///
fn write_engineering(writer: &mut impl Write, x: Float, sig_digits: usize) -> Result<()> {
    let mut precision = sig_digits - 1;
    if x == 0. {
        // Zero is special because you can't take its log
        write!(writer, "0")
    } else {
        let log_x = x.abs().log10();
        if log_x >= -3. && log_x <= (sig_digits as Float) {
            // Rust's precision counts digits after the decimal point, adjust it
            // to keep a constant number of significant digits
            precision = (precision as isize - log_x.trunc() as isize) as usize;
            if log_x < 0. {
                precision += 1
            }

            // No trailing zeros or decimal point in naive notation
            let str_with_zeros = format!("{:.1$}", x, precision);
            if str_with_zeros.contains('.') {
                write!(
                    writer,
                    "{}",
                    str_with_zeros.trim_end_matches('0').trim_end_matches('.')
                )
            } else {
                write!(writer, "{str_with_zeros}")
            }
        } else {
            write!(writer, "{:.1$e}", x, precision)
        }
    }
}
