mod health_check;
mod helpers;
mod postgres_store;
