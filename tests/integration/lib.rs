mod gelf_udp;
