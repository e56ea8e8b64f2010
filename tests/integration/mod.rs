mod snapshot_flow;
