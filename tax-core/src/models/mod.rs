mod filing_status;
mod selection;
mod standard_deduction;
mod tax_return;

pub use filing_status::{FilingStatusCode, FilingStatusOption, InvalidStatusValue};
pub use selection::{FilingStatusRecord, FilingStatusSelection, QualifyingPerson, SpouseDetails};
pub use standard_deduction::{DeductionAmount, StandardDeductionTable};
pub use tax_return::{NewTaxReturn, ReturnStatus, TaxReturn};
