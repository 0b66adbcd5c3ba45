pub mod fixtures;

#[cfg(test)]
mod tender_flow_tests;
#[cfg(test)]
mod award_tests;
#[cfg(test)]
mod contract_tests;
