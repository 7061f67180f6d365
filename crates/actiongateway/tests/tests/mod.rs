mod exposition;
mod projects;
mod schemas;
