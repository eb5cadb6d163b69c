mod client;
mod error;
mod integration;
mod memory;
mod types;

pub use client::{CalendarBackend, RestCalendarClient};
pub use error::BookingError;
pub use integration::{CalendarIntegration, Contact};
pub use memory::InMemoryCalendar;
pub use types::{
    Agendamento, AgendamentoData, AgendamentoStatus, Bloqueio, NovoAgendamento, Slot, Turno,
};
