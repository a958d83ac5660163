//! BenchmarkTarget - entry points called by the hosting runtime
//!
//! The target ties together the counter bank, the buffer store, the writable
//! scalar and the pipe record. Every entry point is `&self` and safe to call
//! from concurrent client sessions.
//!
//! Call flow for a typical attribute read issued by the host:
//!
//! 1. `always_executed_hook()`
//! 2. `read_attr_hardware(&[...])`
//! 3. `read_attribute(attr)` (gated by the policy table)
//!
//! Payload exchanges are counted only when they succeed.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::{debug, instrument, warn};

use crate::attributes::{Attribute, AttributeValue, Command, CommandArg};
use crate::buffers::{BufferStore, ImageFrame};
use crate::config::TargetConfig;
use crate::counters::{Category, CounterBank, CounterSnapshot};
use crate::error::{BenchmarkError, Result};
use crate::pipe::PipeBlob;
use crate::policy::{self, Request};

/// Call-counting benchmark target.
#[derive(Debug)]
pub struct BenchmarkTarget {
    counters: CounterBank,
    buffers: BufferStore,
    /// `f64` bits of the writable scalar.
    scalar: AtomicU64,
    pipe: RwLock<PipeBlob>,
}

impl BenchmarkTarget {
    /// Creates a target from a configuration, validating it first.
    pub fn new(config: &TargetConfig) -> Result<Self> {
        config.validate()?;
        let b = &config.buffers;
        Ok(Self {
            counters: CounterBank::new(),
            buffers: BufferStore::new(b.spectrum_length, b.image_rows, b.image_cols)?,
            scalar: AtomicU64::new(config.scalar.initial_value.to_bits()),
            pipe: RwLock::new(PipeBlob::default()),
        })
    }

    pub fn counters(&self) -> &CounterBank {
        &self.counters
    }

    pub fn buffers(&self) -> &BufferStore {
        &self.buffers
    }

    /// Consistent copy of every counter and the elapsed time.
    pub fn snapshot(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    // ------------------------------------------------------------------
    // Lifecycle hooks
    // ------------------------------------------------------------------

    /// Hook the host runs before every request.
    pub fn always_executed_hook(&self) {
        self.counters.increment(Category::AlwaysExecutedHook);
    }

    /// Hardware acquisition before a batch of attribute reads. Counted once
    /// per batch regardless of its size.
    pub fn read_attr_hardware(&self, attrs: &[Attribute]) {
        self.counters.increment(Category::ReadAttributeHardware);
        debug!("read_attr_hardware for {} attributes", attrs.len());
    }

    /// Hardware writing after a batch of attribute writes. Not counted.
    pub fn write_attr_hardware(&self, attrs: &[Attribute]) {
        debug!("write_attr_hardware for {} attributes", attrs.len());
    }

    // ------------------------------------------------------------------
    // Typed attribute accessors
    // ------------------------------------------------------------------

    pub fn read_benchmark_scalar(&self) -> f64 {
        let value = self.load_scalar();
        self.counters.increment(Category::ScalarRead);
        value
    }

    pub fn write_benchmark_scalar(&self, value: f64) {
        self.store_scalar(value);
        self.counters.increment(Category::ScalarWrite);
    }

    pub fn read_spectrum(&self) -> Vec<f64> {
        let values = self.buffers.read_spectrum();
        self.counters.increment(Category::SpectrumRead);
        values
    }

    /// Fails with `ShapeMismatch` unless `values` has the configured length.
    pub fn write_spectrum(&self, values: Vec<f64>) -> Result<()> {
        self.buffers.write_spectrum(values)?;
        self.counters.increment(Category::SpectrumWrite);
        Ok(())
    }

    pub fn read_image(&self) -> ImageFrame {
        let frame = self.buffers.read_image();
        self.counters.increment(Category::ImageRead);
        frame
    }

    /// Fails with `ShapeMismatch` unless `frame` has the configured shape.
    pub fn write_image(&self, frame: ImageFrame) -> Result<()> {
        self.buffers.write_image(frame)?;
        self.counters.increment(Category::ImageWrite);
        Ok(())
    }

    /// Nested-rows form of [`write_image`](Self::write_image).
    pub fn write_image_rows(&self, rows: Vec<Vec<f64>>) -> Result<()> {
        self.write_image(ImageFrame::from_rows(rows)?)
    }

    /// Current value of a counter. Reading it is not counted.
    pub fn count(&self, category: Category) -> u64 {
        self.counters.get(category)
    }

    /// Seconds since the last reset.
    pub fn time_since_reset(&self) -> f64 {
        self.counters.elapsed_since_reset().as_secs_f64()
    }

    // ------------------------------------------------------------------
    // Generic attribute dispatch
    // ------------------------------------------------------------------

    /// Reads an attribute after checking the policy table and counts it
    /// under the attribute's read category, if it has one.
    pub fn read_attribute(&self, attr: Attribute) -> Result<AttributeValue> {
        self.gate(Request::ReadAttribute(attr))?;
        let value = match attr {
            Attribute::BenchmarkScalar => AttributeValue::Double(self.load_scalar()),
            Attribute::BenchmarkSpectrum => AttributeValue::Spectrum(self.buffers.read_spectrum()),
            Attribute::BenchmarkImage => AttributeValue::Image(self.buffers.read_image()),
            Attribute::TimeSinceReset => AttributeValue::Double(self.time_since_reset()),
            Attribute::Count(category) => AttributeValue::ULong64(self.count(category)),
        };
        if let Some(category) = attr.read_category() {
            self.counters.increment(category);
        }
        Ok(value)
    }

    /// Writes an attribute after checking the policy table.
    ///
    /// The value variant must match the attribute type, otherwise the write
    /// fails with `InvalidArgument`.
    pub fn write_attribute(&self, attr: Attribute, value: AttributeValue) -> Result<()> {
        self.gate(Request::WriteAttribute(attr))?;
        match (attr, value) {
            (Attribute::BenchmarkScalar, AttributeValue::Double(v)) => self.store_scalar(v),
            (Attribute::BenchmarkSpectrum, AttributeValue::Spectrum(values)) => {
                self.buffers.write_spectrum(values)?
            }
            (Attribute::BenchmarkImage, AttributeValue::Image(frame)) => {
                self.buffers.write_image(frame)?
            }
            (attr, value) => {
                return Err(BenchmarkError::invalid_argument(
                    attr.name(),
                    format!("unexpected {} value", value.type_name()),
                ))
            }
        }
        if let Some(category) = attr.write_category() {
            self.counters.increment(category);
        }
        Ok(())
    }

    /// Name-addressed form of [`read_attribute`](Self::read_attribute).
    pub fn read_attribute_by_name(&self, name: &str) -> Result<AttributeValue> {
        self.read_attribute(name.parse()?)
    }

    /// Name-addressed form of [`write_attribute`](Self::write_attribute).
    pub fn write_attribute_by_name(&self, name: &str, value: AttributeValue) -> Result<()> {
        self.write_attribute(name.parse()?, value)
    }

    // ------------------------------------------------------------------
    // Pipe
    // ------------------------------------------------------------------

    /// Returns the current pipe record.
    pub fn read_pipe(&self) -> Result<PipeBlob> {
        self.gate(Request::ReadPipe)?;
        let blob = self.pipe.read().clone();
        self.counters.increment(Category::PipeRead);
        Ok(blob)
    }

    /// Stores a record; later reads echo it back.
    pub fn write_pipe(&self, blob: PipeBlob) -> Result<()> {
        self.gate(Request::WritePipe)?;
        debug!("Pipe written: {} ({} elements)", blob.name(), blob.len());
        *self.pipe.write() = blob;
        self.counters.increment(Category::PipeWrite);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// No-op command whose only effect is the call counter.
    pub fn benchmark_command(&self) {
        self.counters.increment(Category::CommandCall);
    }

    #[instrument(skip(self))]
    pub fn set_spectrum_size(&self, length: i32) -> Result<()> {
        self.buffers.set_spectrum_length(i64::from(length))
    }

    #[instrument(skip(self))]
    pub fn set_image_size(&self, rows: i32, cols: i32) -> Result<()> {
        self.buffers.set_image_size(i64::from(rows), i64::from(cols))
    }

    /// Zeroes every counter and returns the values that were cleared.
    #[instrument(skip(self))]
    pub fn reset_counters(&self) -> CounterSnapshot {
        self.counters.reset_all()
    }

    /// Executes a command after checking the policy table.
    pub fn command_inout(&self, command: Command, arg: CommandArg) -> Result<()> {
        self.gate(Request::Command(command))?;
        match (command, arg) {
            (Command::BenchmarkCommand, CommandArg::Void) => {
                self.benchmark_command();
                Ok(())
            }
            (Command::SetSpectrumSize, CommandArg::Long(length)) => {
                self.set_spectrum_size(length)
            }
            (Command::SetImageSize, CommandArg::LongArray(dims)) => match dims.as_slice() {
                [rows, cols] => self.set_image_size(*rows, *cols),
                _ => Err(BenchmarkError::invalid_argument(
                    command.name(),
                    format!("expected [rows, cols], got {} values", dims.len()),
                )),
            },
            (Command::ResetCounters, CommandArg::Void) => {
                self.reset_counters();
                Ok(())
            }
            (command, arg) => Err(BenchmarkError::invalid_argument(
                command.name(),
                format!("unexpected argument {:?}", arg),
            )),
        }
    }

    /// Name-addressed form of [`command_inout`](Self::command_inout).
    pub fn command_inout_by_name(&self, name: &str, arg: CommandArg) -> Result<()> {
        self.command_inout(name.parse()?, arg)
    }

    fn load_scalar(&self) -> f64 {
        f64::from_bits(self.scalar.load(Ordering::Acquire))
    }

    fn store_scalar(&self, value: f64) {
        self.scalar.store(value.to_bits(), Ordering::Release);
    }

    fn gate(&self, request: Request) -> Result<()> {
        policy::check(&request).inspect_err(|e| warn!("{}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipe::PipeValue;
    use pretty_assertions::assert_eq;

    fn target() -> BenchmarkTarget {
        let mut config = TargetConfig::default();
        config.buffers.spectrum_length = 8;
        config.buffers.image_rows = 2;
        config.buffers.image_cols = 2;
        BenchmarkTarget::new(&config).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = TargetConfig::default();
        config.buffers.image_rows = 0;
        assert!(BenchmarkTarget::new(&config).is_err());
    }

    #[test]
    fn test_initial_scalar_from_config() {
        let mut config = TargetConfig::default();
        config.buffers.image_rows = 1;
        config.buffers.image_cols = 1;
        config.scalar.initial_value = 2.5;
        let target = BenchmarkTarget::new(&config).unwrap();
        assert_eq!(target.read_benchmark_scalar(), 2.5);
    }

    #[test]
    fn test_scalar_read_write_counts() {
        let target = target();
        target.write_benchmark_scalar(-4.0);
        assert_eq!(target.read_benchmark_scalar(), -4.0);
        assert_eq!(target.read_benchmark_scalar(), -4.0);
        assert_eq!(target.count(Category::ScalarWrite), 1);
        assert_eq!(target.count(Category::ScalarRead), 2);
    }

    #[test]
    fn test_hooks_counted() {
        let target = target();
        target.always_executed_hook();
        target.read_attr_hardware(&[Attribute::BenchmarkScalar, Attribute::BenchmarkImage]);
        target.write_attr_hardware(&[Attribute::BenchmarkScalar]);

        let snap = target.snapshot();
        assert_eq!(snap.get(Category::AlwaysExecutedHook), 1);
        assert_eq!(snap.get(Category::ReadAttributeHardware), 1);
        assert_eq!(snap.total(), 2);
    }

    #[test]
    fn test_read_attribute_dispatch() {
        let target = target();
        assert_eq!(
            target.read_attribute(Attribute::BenchmarkSpectrum).unwrap(),
            AttributeValue::Spectrum(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0])
        );
        assert_eq!(
            target
                .read_attribute(Attribute::Count(Category::SpectrumRead))
                .unwrap(),
            AttributeValue::ULong64(1)
        );
        // Reading a counter attribute is not itself counted
        assert_eq!(target.snapshot().total(), 1);
    }

    #[test]
    fn test_dispatch_counts_each_payload_category_once() {
        let target = target();
        let image = ImageFrame::new(2, 2, vec![1.0; 4]).unwrap();
        let writes = [
            (Attribute::BenchmarkScalar, AttributeValue::Double(2.5)),
            (Attribute::BenchmarkSpectrum, AttributeValue::Spectrum(vec![1.0; 8])),
            (Attribute::BenchmarkImage, AttributeValue::Image(image)),
        ];
        for (attr, value) in writes {
            target.write_attribute(attr, value).unwrap();
            target.read_attribute(attr).unwrap();
            assert_eq!(target.count(attr.read_category().unwrap()), 1, "{}", attr);
            assert_eq!(target.count(attr.write_category().unwrap()), 1, "{}", attr);
        }
        target.read_attribute(Attribute::TimeSinceReset).unwrap();
        assert_eq!(target.snapshot().total(), 6);
    }

    #[test]
    fn test_write_read_only_attribute_rejected() {
        let target = target();
        let err = target
            .write_attribute(Attribute::TimeSinceReset, AttributeValue::Double(0.0))
            .unwrap_err();
        assert!(matches!(err, BenchmarkError::NotAllowed { .. }));
        assert_eq!(target.snapshot().total(), 0);
    }

    #[test]
    fn test_write_attribute_wrong_type() {
        let target = target();
        let err = target
            .write_attribute(Attribute::BenchmarkScalar, AttributeValue::ULong64(1))
            .unwrap_err();
        assert!(matches!(err, BenchmarkError::InvalidArgument { .. }));
        assert_eq!(target.count(Category::ScalarWrite), 0);
    }

    #[test]
    fn test_failed_write_not_counted() {
        let target = target();
        assert!(target.write_spectrum(vec![1.0; 3]).is_err());
        assert!(target.write_image_rows(vec![vec![1.0]]).is_err());
        assert_eq!(target.count(Category::SpectrumWrite), 0);
        assert_eq!(target.count(Category::ImageWrite), 0);
    }

    #[test]
    fn test_write_attribute_by_name() {
        let target = target();
        target
            .write_attribute_by_name("BenchmarkScalarAttribute", AttributeValue::Double(3.0))
            .unwrap();
        assert_eq!(
            target
                .read_attribute_by_name("ScalarWritesCount")
                .unwrap()
                .as_u64(),
            Some(1)
        );
        assert!(matches!(
            target.read_attribute_by_name("NoSuchAttribute"),
            Err(BenchmarkError::UnknownAttribute { .. })
        ));
    }

    #[test]
    fn test_pipe_echo() {
        let target = target();
        assert_eq!(target.read_pipe().unwrap(), PipeBlob::default());

        let blob = PipeBlob::new("Custom").with_element("n", PipeValue::Long(7));
        target.write_pipe(blob.clone()).unwrap();
        assert_eq!(target.read_pipe().unwrap(), blob);

        assert_eq!(target.count(Category::PipeRead), 2);
        assert_eq!(target.count(Category::PipeWrite), 1);
    }

    #[test]
    fn test_benchmark_command_counts() {
        let target = target();
        target
            .command_inout(Command::BenchmarkCommand, CommandArg::Void)
            .unwrap();
        target.benchmark_command();
        assert_eq!(target.count(Category::CommandCall), 2);
        assert_eq!(target.snapshot().total(), 2);
    }

    #[test]
    fn test_resize_commands() {
        let target = target();
        target
            .command_inout_by_name("SetSpectrumSize", CommandArg::Long(100))
            .unwrap();
        assert_eq!(target.read_spectrum().len(), 100);

        target
            .command_inout(Command::SetImageSize, CommandArg::LongArray(vec![2, 3]))
            .unwrap();
        assert_eq!(target.buffers().image_size(), (2, 3));

        assert!(matches!(
            target.command_inout(Command::SetSpectrumSize, CommandArg::Long(-1)),
            Err(BenchmarkError::OutOfRange { .. })
        ));
        assert!(matches!(
            target.command_inout(Command::SetImageSize, CommandArg::LongArray(vec![2])),
            Err(BenchmarkError::InvalidArgument { .. })
        ));
        assert!(matches!(
            target.command_inout(Command::SetImageSize, CommandArg::Long(2)),
            Err(BenchmarkError::InvalidArgument { .. })
        ));
        // Resize commands do not touch the counters
        assert_eq!(target.count(Category::CommandCall), 0);
    }

    #[test]
    fn test_reset_counters_keeps_buffers() {
        let target = target();
        target.set_spectrum_size(5).unwrap();
        target.write_spectrum(vec![9.0; 5]).unwrap();
        target.benchmark_command();

        assert_eq!(target.reset_counters().get(Category::CommandCall), 1);
        target.benchmark_command();
        target
            .command_inout(Command::ResetCounters, CommandArg::Void)
            .unwrap();

        assert_eq!(target.snapshot().total(), 0);
        assert_eq!(target.buffers().read_spectrum(), vec![9.0; 5]);
    }

    #[test]
    fn test_image_round_trip() {
        let target = target();
        target.set_image_size(2, 3).unwrap();
        target
            .write_image_rows(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]])
            .unwrap();
        assert_eq!(
            target.read_image().to_rows(),
            vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]
        );
        assert_eq!(target.count(Category::ImageWrite), 1);
        assert_eq!(target.count(Category::ImageRead), 1);
    }
}
